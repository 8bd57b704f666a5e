//! Batch file discovery
//!
//! Recursively lists analyzable files under a project directory, skipping
//! dependency, build and VCS directories. Symlinks are not followed.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::extension_policy::{detect_language, ExtensionPolicy};

/// Discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot read file metadata
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// One analyzable file
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// Path relative to the project directory, `/`-separated
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub extension: String,
    pub language: String,
    pub size_bytes: u64,
    pub is_priority: bool,
}

/// Discovery result with totals
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    pub files: Vec<DiscoveredFile>,
    pub total_size: u64,
    pub priority_count: usize,
}

/// Lists eligible files under a project directory
#[derive(Debug, Clone, Default)]
pub struct FileDiscoverer {
    policy: ExtensionPolicy,
}

impl FileDiscoverer {
    pub fn new(policy: ExtensionPolicy) -> Self {
        Self { policy }
    }

    /// Discover files in deterministic (name-sorted) traversal order
    pub fn discover(&self, root_path: &Path) -> Result<DiscoveryResult, DiscoveryError> {
        if !root_path.exists() {
            return Err(DiscoveryError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(DiscoveryError::NotADirectory(root_path.to_path_buf()));
        }

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| Self::should_descend(e));

        let mut result = DiscoveryResult::default();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.policy.is_supported(entry.path()) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                DiscoveryError::FileAccessError(entry.path().to_path_buf(), e.to_string())
            })?;

            let file = self.describe(root_path, entry.path(), metadata.len());
            result.total_size += file.size_bytes;
            if file.is_priority {
                result.priority_count += 1;
            }
            result.files.push(file);
        }

        tracing::debug!(
            root = %root_path.display(),
            files = result.files.len(),
            total_size = result.total_size,
            "Discovery complete"
        );

        Ok(result)
    }

    /// Skip ignored directories; the root itself is always entered
    fn should_descend(entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !ExtensionPolicy::is_skipped_directory(&entry.file_name().to_string_lossy())
    }

    fn describe(&self, root: &Path, path: &Path, size_bytes: u64) -> DiscoveredFile {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        DiscoveredFile {
            relative_path,
            absolute_path: path.to_path_buf(),
            extension: ExtensionPolicy::extension_of(path).unwrap_or_default(),
            language: detect_language(path).to_string(),
            size_bytes,
            is_priority: self.policy.is_priority(path),
        }
    }
}
