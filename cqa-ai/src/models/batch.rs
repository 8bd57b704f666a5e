//! Batch analysis result types (never persisted as such)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisReport;

/// Successful analysis of one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    /// Path relative to the project directory
    pub filename: String,
    pub language: String,
    pub size_bytes: u64,
    pub is_priority: bool,
    /// Model that produced the report
    pub model: String,
    #[serde(flatten)]
    pub analysis: AnalysisReport,
}

/// Failed analysis of one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub filename: String,
    pub error: String,
}

/// Per-file outcome, in processing order
///
/// On the wire a success is the report fields inline with the file details,
/// a failure is `{filename, error}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileOutcome {
    Success(FileAnalysis),
    Failure(FileFailure),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success(_))
    }
}

/// Outcome of one batch run over a project directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub project_id: Uuid,
    pub total_files: usize,
    pub successful_analyses: usize,
    pub failed_analyses: usize,
    pub priority_files: usize,
    pub results: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn successes(&self) -> impl Iterator<Item = &FileAnalysis> {
        self.results.iter().filter_map(|outcome| match outcome {
            FileOutcome::Success(analysis) => Some(analysis),
            FileOutcome::Failure(_) => None,
        })
    }
}
