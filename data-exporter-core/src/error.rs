//! Error types for the core crate.
//!
//! Fetch failures are deliberately absent: they never surface as errors.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing run configuration. Raised before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument(s): {}", .0.join(", "))]
    MissingArguments(Vec<&'static str>),

    #[error("at least one of max page depth and max DAM depth must be specified")]
    MissingDepth,

    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("invalid value for {argument}: {value:?}")]
    InvalidValue {
        argument: &'static str,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("partition size must be greater than zero")]
    ZeroSize,
}

/// Failure while writing vault manifests or the package zip.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {document}: {message}")]
    Render {
        document: &'static str,
        message: String,
    },

    #[error("failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a package-manager step. Always fatal for the run.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("{action} of {package} was unsuccessful: {message}")]
    Rejected {
        action: &'static str,
        package: String,
        message: String,
    },

    #[error("unable to read package manager response for {action}: {message}")]
    InvalidResponse {
        action: &'static str,
        message: String,
    },

    #[error("local file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Failure while creating packages from discovered content.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
