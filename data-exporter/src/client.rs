//! # CRX client (CLI <-> Core)
//!
//! [`CrxClient`] implements the core's [`ContentFetcher`] and [`PackageManager`]
//! traits on top of a single `reqwest::Client` with basic auth. Every request
//! has a 600 second timeout and is attempted exactly once.
//!
//! Content fetches never fail: transport errors and non-success statuses are
//! logged and yield an empty body. Package-manager calls surface a
//! [`TransferError`] instead.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use data_exporter_core::contract::{
    ContentFetcher, PackageArchive, PackageManager, PackageManagerResponse,
};
use data_exporter_core::error::{TransferError, TransferResult};
use data_exporter_core::transfer::{parse_response, validate_response};
use data_exporter_core::PACKAGE_GROUP;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::load_config::Connection;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

const JSON_SERVICE: &str = "/crx/packmgr/service/.json";
const JSP_SERVICE: &str = "/crx/packmgr/service.jsp";

pub struct CrxClient {
    http: Client,
    host: String,
    username: String,
    password: String,
}

impl CrxClient {
    pub fn new(connection: &Connection) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        info!(host = %connection.host, username = %connection.username, "Initialized CRX client");
        Ok(Self {
            http,
            host: connection.host.clone(),
            username: connection.username.clone(),
            password: connection.password.clone(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}{}", self.host, resource)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// Sends the request and turns transport errors and error statuses into [`TransferError`].
    async fn send(&self, url: &str, request: RequestBuilder) -> TransferResult<Response> {
        let response = self.authorized(request).send().await.map_err(|e| {
            error!(url, error = ?e, "Request to package manager failed");
            TransferError::Request {
                url: url.to_owned(),
                message: e.to_string(),
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            error!(url, status = status.as_u16(), "Package manager returned error status");
            return Err(TransferError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn body(url: &str, response: Response) -> TransferResult<String> {
        response.text().await.map_err(|e| TransferError::Request {
            url: url.to_owned(),
            message: e.to_string(),
        })
    }

    /// POSTs a `cmd` against an uploaded package and parses the JSON response.
    async fn package_command(
        &self,
        action: &'static str,
        command: &str,
        package_name: &str,
    ) -> TransferResult<PackageManagerResponse> {
        let url = self.url(&package_command_resource(command, package_name));
        info!(action, package = package_name, url = %url, "Sending package command");
        let response = self.send(&url, self.http.post(&url)).await?;
        let body = Self::body(&url, response).await?;
        parse_response(action, &body)
    }
}

fn package_command_resource(command: &str, package_name: &str) -> String {
    format!("{JSON_SERVICE}/etc/packages/{PACKAGE_GROUP}/{package_name}.zip?cmd={command}")
}

fn upload_resource() -> String {
    format!("{JSON_SERVICE}/?cmd=upload&force=true")
}

fn download_resource(package_name: &str) -> String {
    format!("{JSP_SERVICE}?name={package_name}&group={PACKAGE_GROUP}")
}

fn remove_resource(package_name: &str) -> String {
    format!("{JSP_SERVICE}?cmd=rm&name={package_name}&group={PACKAGE_GROUP}")
}

#[async_trait]
impl ContentFetcher for CrxClient {
    async fn fetch(&self, resource: &str) -> Vec<u8> {
        let url = self.url(resource);
        let response = match self.authorized(self.http.get(&url)).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = ?e, "Fetch failed");
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            debug!(url = %url, status = response.status().as_u16(), "Fetch returned error status");
            return Vec::new();
        }
        match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                debug!(url = %url, error = ?e, "Reading fetch body failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PackageManager for CrxClient {
    async fn upload(&self, archive: &PackageArchive) -> TransferResult<()> {
        let url = self.url(&upload_resource());
        info!(package = %archive.name, file = %archive.path.display(), "Uploading package");
        let bytes = tokio::fs::read(&archive.path)
            .await
            .map_err(|e| TransferError::Io {
                path: archive.path.clone(),
                source: e,
            })?;
        let part = Part::bytes(bytes)
            .file_name(format!("{}.zip", archive.name))
            .mime_str("application/zip")
            .map_err(|e| TransferError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let form = Form::new()
            .part("package", part)
            .text("name", archive.name.clone());

        let response = self.send(&url, self.http.post(&url).multipart(form)).await?;
        let body = Self::body(&url, response).await?;
        let parsed = parse_response("upload", &body)?;
        validate_response("upload", &archive.name, &parsed)
    }

    async fn build(&self, package_name: &str) -> TransferResult<PackageManagerResponse> {
        self.package_command("build", "build", package_name).await
    }

    async fn install(&self, package_name: &str) -> TransferResult<PackageManagerResponse> {
        self.package_command("installation", "install", package_name)
            .await
    }

    async fn download(&self, archive: &PackageArchive) -> TransferResult<u64> {
        let url = self.url(&download_resource(&archive.name));
        info!(package = %archive.name, url = %url, "Downloading package");
        let mut response = self.send(&url, self.http.get(&url)).await?;

        let io_error = |source| TransferError::Io {
            path: archive.path.clone(),
            source,
        };
        if let Some(parent) = archive.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory(parent).await.map_err(io_error)?;
        }
        let mut file = tokio::fs::File::create(&archive.path)
            .await
            .map_err(io_error)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| TransferError::Request {
            url: url.clone(),
            message: e.to_string(),
        })? {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;
        Ok(written)
    }

    async fn remove(&self, package_name: &str) -> TransferResult<()> {
        let url = self.url(&remove_resource(package_name));
        info!(package = package_name, url = %url, "Removing package");
        self.send(&url, self.http.post(&url)).await?;
        Ok(())
    }
}

async fn ensure_directory(dir: &Path) -> std::io::Result<()> {
    if tokio::fs::metadata(dir).await.is_err() {
        debug!(dir = %dir.display(), "Directory not found, creating directory");
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}
