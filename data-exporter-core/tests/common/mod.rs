#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use data_exporter_core::contract::ContentFetcher;

/// Serves canned JSON per resource and records every request.
#[derive(Default)]
pub struct FakeRepository {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: &str, body: serde_json::Value) -> Self {
        self.responses
            .insert(resource.to_owned(), body.to_string().into_bytes());
        self
    }

    pub fn with_raw(mut self, resource: &str, body: &str) -> Self {
        self.responses
            .insert(resource.to_owned(), body.as_bytes().to_vec());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, resource: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == resource)
            .count()
    }
}

#[async_trait]
impl ContentFetcher for FakeRepository {
    async fn fetch(&self, resource: &str) -> Vec<u8> {
        self.requests.lock().unwrap().push(resource.to_owned());
        self.responses.get(resource).cloned().unwrap_or_default()
    }
}
