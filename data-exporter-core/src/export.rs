//! Package creation: discover → partition → write one artifact per partition.

use tracing::info;

use crate::artifact::ArtifactWriter;
use crate::config::ExportRequest;
use crate::contract::{ContentFetcher, PackageArchive};
use crate::discovery::DiscoveryEngine;
use crate::error::ExportError;
use crate::partition::{partition, MAXIMUM_PACKAGE_CONTENT_PATHS};

/// Outcome of [`create_packages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of distinct content paths discovered.
    pub content_paths: usize,
    /// Written archives in sequence order.
    pub packages: Vec<PackageArchive>,
}

impl ExportSummary {
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

/// Discovers content below `request.path` and writes one package per partition.
pub async fn create_packages<F>(
    fetcher: &F,
    request: &ExportRequest,
) -> Result<ExportSummary, ExportError>
where
    F: ContentFetcher + ?Sized,
{
    info!(path = %request.path, package = %request.package_name, "Creating packages");
    let content = DiscoveryEngine::new(fetcher, request.limits)
        .discover(&request.path)
        .await;

    let writer = ArtifactWriter::new(&request.working_directory);
    let mut packages = Vec::new();
    for part in partition(&content, MAXIMUM_PACKAGE_CONTENT_PATHS)? {
        let name = part.package_name(&request.package_name);
        let path = writer.write(&part.paths, &request.username, &name)?;
        packages.push(PackageArchive { name, path });
    }

    info!(
        content_paths = content.len(),
        packages = packages.len(),
        "Package creation complete"
    );
    Ok(ExportSummary {
        content_paths: content.len(),
        packages,
    })
}
