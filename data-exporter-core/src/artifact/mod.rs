//! # artifact: vault package files and archives
//!
//! For each partition the [`ArtifactWriter`] renders the vault metadata
//! documents, writes them below `<working_directory>/<package_name>/` and
//! bundles them into `<working_directory>/<package_name>.zip`, which is what
//! the transfer pipeline uploads.

pub mod document;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub use document::{PackageContext, VaultDocument};

use crate::error::{ArtifactError, ArtifactResult};

pub struct ArtifactWriter {
    working_directory: PathBuf,
}

impl ArtifactWriter {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
        }
    }

    /// Writes the manifests and archive for one package; returns the archive path.
    pub fn write(
        &self,
        paths: &[String],
        username: &str,
        package_name: &str,
    ) -> ArtifactResult<PathBuf> {
        self.write_context(&PackageContext::new(paths, username, package_name))
    }

    pub fn write_context(&self, context: &PackageContext<'_>) -> ArtifactResult<PathBuf> {
        let staging = self.working_directory.join(context.package_name);
        let mut rendered = Vec::with_capacity(VaultDocument::ALL.len());
        for document in VaultDocument::ALL {
            let bytes = document.render(context)?;
            write_file(&staging.join(document.entry_name()), &bytes)?;
            rendered.push((document, bytes));
        }
        debug!(package = %context.package_name, dir = %staging.display(), "Wrote package files");

        let archive = self
            .working_directory
            .join(format!("{}.zip", context.package_name));
        write_archive(&archive, &rendered)?;
        info!(
            package = %context.package_name,
            paths = context.paths.len(),
            archive = %archive.display(),
            "Created package archive"
        );
        Ok(archive)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> ArtifactResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            debug!(dir = %parent.display(), "Directory not found, creating directory");
            fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
        }
    }
    fs::write(path, bytes).map_err(|e| ArtifactError::io(path, e))
}

fn write_archive(path: &Path, documents: &[(VaultDocument, Vec<u8>)]) -> ArtifactResult<()> {
    let archive_error = |source| ArtifactError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| ArtifactError::io(path, e))?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(file);
    for (document, bytes) in documents {
        zip.start_file(document.entry_name(), options)
            .map_err(archive_error)?;
        zip.write_all(bytes).map_err(|e| ArtifactError::io(path, e))?;
    }
    zip.finish().map_err(archive_error)?;
    Ok(())
}
