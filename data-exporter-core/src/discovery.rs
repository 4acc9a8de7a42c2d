//! # discovery: content-path discovery engine
//!
//! Turns the remote content tree below a seed path into a flat, ordered,
//! deduplicated [`ContentSet`] in two phases:
//!
//! 1. **Pages.** Starting at the seed, child pages are read from each page's
//!    `.infinity.json` rendering. Recursion draws from a single
//!    [`PageBudget`] shared by every branch, so `max_page_depth` bounds the
//!    total number of recursive page fetches, not the depth of any one branch.
//! 2. **Assets.** For every collected page, DAM references are read from its
//!    `jcr:content` and expanded recursively. Each page gets its own
//!    [`VisitedSet`] and starts at depth zero; depth travels with the call
//!    frame, so it is restored when a branch returns.
//!
//! A failed or unparseable fetch contributes no paths and never aborts the run.

use std::collections::HashSet;
use std::sync::LazyLock;

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use tracing::{debug, info};

use crate::config::DepthLimits;
use crate::contract::ContentFetcher;
use crate::parser;

/// Selector for the full-depth JSON rendering of a page.
pub const PAGE_RENDERING: &str = ".infinity.json";

/// Suffix for the full-depth rendering of a node's `jcr:content`.
pub const CONTENT_RENDERING: &str = "/jcr:content.infinity.json";

/// `.json` optionally preceded by a numeric depth selector, e.g. `.3.json`.
static JSON_RENDERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.\d*)?\.json$").expect("static regex"));

/// Paths expanded during asset discovery for one top-level page.
pub type VisitedSet = HashSet<String>;

/// Insertion-ordered set of content paths.
///
/// Order decides which package a path lands in, so it must be reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl ContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path; returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.members.contains(&path) {
            return false;
        }
        self.members.insert(path.clone());
        self.order.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

impl<S: Into<String>> FromIterator<S> for ContentSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ContentSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ContentSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ContentSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

/// Recursion allowance for the page phase, shared across all branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    used: usize,
    max: usize,
}

impl PageBudget {
    pub fn new(max: usize) -> Self {
        Self { used: 0, max }
    }

    pub fn has_remaining(&self) -> bool {
        self.used < self.max
    }

    /// Takes one unit if any is left. Units are never given back.
    pub fn try_consume(&mut self) -> bool {
        if !self.has_remaining() {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

/// Whether a path already names a JSON rendering rather than a node.
pub fn is_json_rendering(path: &str) -> bool {
    JSON_RENDERING.is_match(path)
}

/// Node path with any trailing `(.<digits>).json` selector removed.
pub fn strip_json_rendering(path: &str) -> String {
    JSON_RENDERING.replace(path, "").into_owned()
}

/// Resource and parent path to use when reading a page's children.
fn page_request(path: &str) -> (String, String) {
    if is_json_rendering(path) {
        (strip_json_rendering(path), path.to_owned())
    } else {
        (path.to_owned(), format!("{path}{PAGE_RENDERING}"))
    }
}

fn content_request(path: &str) -> String {
    format!("{path}{CONTENT_RENDERING}")
}

/// Walks the content tree through a [`ContentFetcher`].
pub struct DiscoveryEngine<'a, F: ContentFetcher + ?Sized> {
    fetcher: &'a F,
    limits: DepthLimits,
}

impl<'a, F: ContentFetcher + ?Sized> DiscoveryEngine<'a, F> {
    pub fn new(fetcher: &'a F, limits: DepthLimits) -> Self {
        Self { fetcher, limits }
    }

    /// The seed plus every page and asset reachable within the depth limits.
    pub async fn discover(&self, seed: &str) -> ContentSet {
        let mut content = ContentSet::new();
        let mut pages = ContentSet::new();
        info!(path = %seed, "Adding page content path");
        pages.insert(seed);
        content.insert(seed);

        let mut budget = PageBudget::new(self.limits.max_page_depth);
        if budget.has_remaining() {
            self.discover_pages(&mut pages, &mut budget, seed.to_owned())
                .await;
        }
        info!(
            pages = pages.len(),
            recursions = budget.used(),
            "Page discovery finished"
        );

        if self.limits.max_dam_depth > 0 {
            for page in &pages {
                self.discover_assets(&mut content, page).await;
            }
        }
        info!(paths = content.len(), "Content discovery finished");
        content
    }

    fn discover_pages<'b>(
        &'b self,
        pages: &'b mut ContentSet,
        budget: &'b mut PageBudget,
        path: String,
    ) -> BoxFuture<'b, ()> {
        async move {
            let (parent, resource) = page_request(&path);
            let data = self.fetcher.fetch(&resource).await;
            for child in parser::page_children(&parent, &data) {
                if !is_json_rendering(&child) && pages.insert(child.clone()) {
                    info!(path = %child, "Adding page content path");
                }
                if budget.try_consume() {
                    self.discover_pages(pages, budget, child).await;
                }
            }
        }
        .boxed()
    }

    async fn discover_assets(&self, content: &mut ContentSet, page: &str) {
        info!(path = %page, "Processing page content path");
        let mut visited = VisitedSet::new();
        let data = self.fetcher.fetch(&content_request(page)).await;
        for asset in parser::asset_paths(page, &data) {
            debug!(path = %asset, "Adding content path");
            content.insert(asset.clone());
            if !visited.contains(&asset) {
                self.expand_asset(content, &mut visited, asset, 0).await;
            }
        }
    }

    fn expand_asset<'b>(
        &'b self,
        content: &'b mut ContentSet,
        visited: &'b mut VisitedSet,
        path: String,
        depth: usize,
    ) -> BoxFuture<'b, ()> {
        async move {
            debug!(path = %path, depth, "Processing content path");
            visited.insert(path.clone());
            let data = self.fetcher.fetch(&content_request(&path)).await;
            for reference in parser::asset_paths(&path, &data) {
                debug!(path = %reference, referenced_by = %path, "Adding content path");
                content.insert(reference.clone());
                if !visited.contains(&reference) && depth < self.limits.max_dam_depth {
                    self.expand_asset(content, visited, reference, depth + 1)
                        .await;
                }
            }
        }
        .boxed()
    }
}
