//! # contract: seams between the core logic and the outside world
//!
//! The discovery engine only ever needs to read bytes for a path, and the
//! transfer pipeline only ever needs the five package-manager commands. Both
//! are expressed as async traits so the CLI crate can plug in a reqwest client
//! and tests can plug in in-memory fakes or `mockall` mocks.
//!
//! ## Error classes
//! - [`ContentFetcher::fetch`] is infallible by contract: any transport or
//!   status failure is folded into an empty body, which the parser turns into
//!   "no further paths from here".
//! - [`PackageManager`] methods return [`TransferError`]; a failure there is
//!   fatal for the whole multi-package run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;

use crate::error::TransferError;

/// Reads the JSON rendering of a node in the content repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// GET `host + resource` and return the body.
    ///
    /// `resource` is the full request path including selectors, e.g.
    /// `/content/site/home.infinity.json`. Returns an empty vector on any failure.
    async fn fetch(&self, resource: &str) -> Vec<u8>;
}

/// Body returned by the package manager's `.json` service endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManagerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "msg")]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Where a package lives on disk during upload/download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArchive {
    /// Package name including the sequence suffix, e.g. `site_export_3`.
    pub name: String,
    /// Local zip file.
    pub path: PathBuf,
}

impl PackageArchive {
    pub fn in_directory(working_directory: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = working_directory.join(format!("{name}.zip"));
        Self { name, path }
    }
}

/// The package-manager commands the transfer pipeline drives.
///
/// Implementations perform a single attempt per call.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Upload the local archive, overwriting a package of the same name.
    async fn upload(&self, archive: &PackageArchive) -> Result<(), TransferError>;

    /// Rebuild an uploaded package so it contains the filtered content.
    async fn build(&self, package_name: &str) -> Result<PackageManagerResponse, TransferError>;

    /// Install an uploaded package into the repository.
    async fn install(&self, package_name: &str) -> Result<PackageManagerResponse, TransferError>;

    /// Stream the built package into the local archive path.
    async fn download(&self, archive: &PackageArchive) -> Result<u64, TransferError>;

    /// Delete the package from the package manager.
    async fn remove(&self, package_name: &str) -> Result<(), TransferError>;
}
