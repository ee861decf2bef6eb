//! Test file discovery
//!
//! Walks the tests directory and keeps files whose name contains the
//! marker, is not ignored, and does not live in the generated output
//! directory. Order follows `read_dir` and is not sorted.

use super::{CodegenError, IgnoreList};
use std::path::{Path, PathBuf};

/// Which files discovery keeps
#[derive(Debug, Clone)]
pub struct DiscoverFilter {
    /// Filename fragment required for a match (e.g. ".js")
    pub marker: String,
    pub ignore: IgnoreList,
    /// Name of the generated output directory, skipped while walking
    pub output_dir: String,
}

impl DiscoverFilter {
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.contains(&self.marker) && !self.ignore.contains(file_name)
    }
}

/// Recursively list test files under `root`
pub async fn discover(
    root: &Path,
    filter: &DiscoverFilter,
) -> Result<Vec<PathBuf>, CodegenError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| CodegenError::io(&dir, source))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| CodegenError::io(&dir, source))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|source| CodegenError::io(&path, source))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                if file_name == filter.output_dir {
                    tracing::trace!(path = %path.display(), "Skipping generated output directory");
                    continue;
                }
                pending.push(path);
            } else if filter.matches(&file_name) {
                files.push(path);
            } else {
                tracing::trace!(path = %path.display(), "Skipping file");
            }
        }
    }

    tracing::debug!(root = %root.display(), count = files.len(), "Discovered test files");
    Ok(files)
}
