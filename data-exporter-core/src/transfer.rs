//! # transfer: sequential package-manager operations
//!
//! Drives one [`TransferStep`] over packages `1..=count` of a base name, one
//! package at a time. The first failing package aborts the run; remaining
//! indices are not attempted. There are no retries.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::package_name;
use crate::contract::{PackageArchive, PackageManager, PackageManagerResponse};
use crate::error::{TransferError, TransferResult};

/// One package-manager command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    Upload,
    Build,
    Install,
    Download,
    Remove,
}

impl TransferStep {
    /// Steps performed after package creation by a full export.
    pub const EXPORT: [TransferStep; 4] = [
        TransferStep::Upload,
        TransferStep::Build,
        TransferStep::Download,
        TransferStep::Remove,
    ];

    pub fn action(self) -> &'static str {
        match self {
            TransferStep::Upload => "upload",
            TransferStep::Build => "build",
            TransferStep::Install => "installation",
            TransferStep::Download => "download",
            TransferStep::Remove => "removal",
        }
    }
}

/// Packages a step completed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub step: TransferStep,
    pub packages: Vec<String>,
}

/// Parses a package-manager JSON body.
pub fn parse_response(action: &'static str, body: &str) -> TransferResult<PackageManagerResponse> {
    serde_json::from_str(body).map_err(|e| {
        error!(action, error = %e, body, "Unable to read JSON from package manager response");
        TransferError::InvalidResponse {
            action,
            message: e.to_string(),
        }
    })
}

/// Turns an unsuccessful package-manager response into an error.
pub fn validate_response(
    action: &'static str,
    package: &str,
    response: &PackageManagerResponse,
) -> TransferResult<()> {
    let message = response.message.clone().unwrap_or_default();
    if response.success {
        info!(action, package, message = %message, "Package manager reported success");
        Ok(())
    } else {
        error!(action, package, message = %message, "Package manager reported failure");
        Err(TransferError::Rejected {
            action,
            package: package.to_owned(),
            message,
        })
    }
}

pub struct TransferPipeline<'a, M: PackageManager + ?Sized> {
    manager: &'a M,
    base_name: String,
    working_directory: PathBuf,
}

impl<'a, M: PackageManager + ?Sized> TransferPipeline<'a, M> {
    pub fn new(
        manager: &'a M,
        base_name: impl Into<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manager,
            base_name: base_name.into(),
            working_directory: working_directory.into(),
        }
    }

    /// Local archive location of package `index`.
    pub fn archive(&self, index: usize) -> PackageArchive {
        PackageArchive::in_directory(&self.working_directory, package_name(&self.base_name, index))
    }

    /// Runs `step` for every package, stopping at the first failure.
    pub async fn run(&self, step: TransferStep, count: usize) -> TransferResult<TransferReport> {
        info!(step = step.action(), count, base = %self.base_name, "[TRANSFER] Starting");
        let mut packages = Vec::with_capacity(count);
        for index in 1..=count {
            let archive = self.archive(index);
            if let Err(e) = self.run_one(step, &archive).await {
                error!(
                    step = step.action(),
                    package = %archive.name,
                    error = %e,
                    "[TRANSFER][ERROR] Aborting remaining packages"
                );
                return Err(e);
            }
            packages.push(archive.name);
        }
        info!(step = step.action(), count, "[TRANSFER] Finished");
        Ok(TransferReport { step, packages })
    }

    /// Runs each step across all packages before moving to the next step.
    pub async fn run_all(
        &self,
        steps: &[TransferStep],
        count: usize,
    ) -> TransferResult<Vec<TransferReport>> {
        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            reports.push(self.run(*step, count).await?);
        }
        Ok(reports)
    }

    async fn run_one(&self, step: TransferStep, archive: &PackageArchive) -> TransferResult<()> {
        match step {
            TransferStep::Upload => self.manager.upload(archive).await,
            TransferStep::Build => {
                let response = self.manager.build(&archive.name).await?;
                validate_response(step.action(), &archive.name, &response)
            }
            TransferStep::Install => {
                let response = self.manager.install(&archive.name).await?;
                validate_response(step.action(), &archive.name, &response)
            }
            TransferStep::Download => {
                let bytes = self.manager.download(archive).await?;
                info!(
                    package = %archive.name,
                    bytes,
                    path = %archive.path.display(),
                    "Finished downloading package"
                );
                Ok(())
            }
            TransferStep::Remove => self.manager.remove(&archive.name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_fields_map_from_package_manager_json() {
        let response = parse_response(
            "installation",
            r#"{"success":true,"msg":"Package installed","path":"/etc/packages/x.zip"}"#,
        )
        .unwrap();
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Package installed"));
        assert_eq!(response.path.as_deref(), Some("/etc/packages/x.zip"));
    }

    #[test]
    fn unreadable_response_is_an_error() {
        let err = parse_response("installation", "<html>").unwrap_err();
        assert!(matches!(err, TransferError::InvalidResponse { action: "installation", .. }));
    }

    #[test]
    fn unsuccessful_response_is_rejected() {
        let response = PackageManagerResponse {
            success: false,
            message: Some("no such package".into()),
            path: None,
        };
        let err = validate_response("build", "site_1", &response).unwrap_err();
        assert_eq!(
            err.to_string(),
            "build of site_1 was unsuccessful: no such package"
        );
    }
}
