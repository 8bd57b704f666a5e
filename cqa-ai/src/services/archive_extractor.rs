//! Archive extraction into a project-scoped directory
//!
//! Entries are flattened to their base filename, so an archive can never
//! write outside `<base>/<project_id>/`. Only supported extensions are kept.
//! A new archive replaces whatever an earlier one left in the directory.

use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use super::extension_policy::{detect_language, ExtensionPolicy};

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive bytes could not be decoded
    #[error("Invalid or corrupted archive: {0}")]
    Decode(String),

    /// Filesystem error while writing extracted files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether anything analyzable came out of the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    Extracted,
    /// Archive decoded fine but held no supported files
    NoRelevantFiles,
}

/// One file written to the project directory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFile {
    /// Base filename inside the project directory
    pub filename: String,
    /// Entry name as stored in the archive
    pub original_path: String,
    pub extension: String,
    pub language: String,
    pub size_bytes: u64,
}

/// An archive entry that was not extracted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub entry: String,
    pub reason: String,
}

/// Extraction summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub project_dir: PathBuf,
    pub files: Vec<ExtractedFile>,
    pub extracted_count: usize,
    pub skipped: Vec<SkippedEntry>,
    pub status: ExtractionStatus,
}

/// Zip extractor bound to a base directory
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    base_dir: PathBuf,
    policy: ExtensionPolicy,
    max_entry_bytes: u64,
}

impl ArchiveExtractor {
    pub fn new(base_dir: PathBuf, policy: ExtensionPolicy, max_entry_bytes: u64) -> Self {
        Self {
            base_dir,
            policy,
            max_entry_bytes,
        }
    }

    /// Directory holding the extracted files of one project
    pub fn project_dir(&self, project_id: Uuid) -> PathBuf {
        self.base_dir.join(project_id.to_string())
    }

    /// Extract an archive held in memory
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        project_id: Uuid,
    ) -> Result<ExtractionReport, ExtractError> {
        self.extract_from(Cursor::new(bytes), project_id)
    }

    fn extract_from<R: Read + Seek>(
        &self,
        reader: R,
        project_id: Uuid,
    ) -> Result<ExtractionReport, ExtractError> {
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| ExtractError::Decode(e.to_string()))?;

        let project_dir = self.project_dir(project_id);
        clear_dir(&project_dir)?;

        let mut files = Vec::new();
        let mut skipped = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| ExtractError::Decode(e.to_string()))?;

            if entry.is_dir() {
                continue;
            }

            let entry_name = entry.name().to_string();
            let Some(filename) = base_filename(&entry_name) else {
                tracing::warn!(entry = %entry_name, "Skipping archive entry with unusable name");
                skipped.push(SkippedEntry {
                    entry: entry_name,
                    reason: "unusable filename".to_string(),
                });
                continue;
            };

            if !self.policy.is_supported(Path::new(&filename)) {
                tracing::debug!(entry = %entry_name, "Skipping unsupported file type");
                skipped.push(SkippedEntry {
                    entry: entry_name,
                    reason: "unsupported extension".to_string(),
                });
                continue;
            }

            if !seen.insert(filename.clone()) {
                tracing::warn!(
                    entry = %entry_name,
                    filename = %filename,
                    "Duplicate base filename in archive, keeping first occurrence"
                );
                skipped.push(SkippedEntry {
                    entry: entry_name,
                    reason: format!("duplicate of {}", filename),
                });
                continue;
            }

            // The declared size can lie, so the read is capped as well
            let mut content = Vec::new();
            if entry.size() <= self.max_entry_bytes {
                entry
                    .by_ref()
                    .take(self.max_entry_bytes + 1)
                    .read_to_end(&mut content)
                    .map_err(|e| ExtractError::Decode(format!("{}: {}", entry_name, e)))?;
            }
            if entry.size() > self.max_entry_bytes || content.len() as u64 > self.max_entry_bytes {
                tracing::warn!(
                    entry = %entry_name,
                    max_bytes = self.max_entry_bytes,
                    "Skipping oversized archive entry"
                );
                skipped.push(SkippedEntry {
                    entry: entry_name,
                    reason: format!("exceeds {} bytes", self.max_entry_bytes),
                });
                continue;
            }

            let target = project_dir.join(&filename);
            std::fs::write(&target, &content)?;

            let path = Path::new(&filename);
            files.push(ExtractedFile {
                extension: ExtensionPolicy::extension_of(path).unwrap_or_default(),
                language: detect_language(path).to_string(),
                size_bytes: content.len() as u64,
                original_path: entry_name,
                filename,
            });
        }

        let status = if files.is_empty() {
            ExtractionStatus::NoRelevantFiles
        } else {
            ExtractionStatus::Extracted
        };

        tracing::info!(
            project_id = %project_id,
            extracted = files.len(),
            skipped = skipped.len(),
            "Archive extracted"
        );

        Ok(ExtractionReport {
            project_dir,
            extracted_count: files.len(),
            files,
            skipped,
            status,
        })
    }
}

/// Empty `dir`, creating it when missing
fn clear_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::create_dir_all(dir)
}

/// Last path component of an entry name, accepting `/` and `\` separators
fn base_filename(entry_name: &str) -> Option<String> {
    let base = entry_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    match base {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
