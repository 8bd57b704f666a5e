//! Batch orchestration
//!
//! Runs every eligible file of a project directory through the reasoning
//! client, priority files first, one at a time. A failing file is recorded
//! and the batch moves on; only the up-front size checks abort a batch.
//! Nothing here touches the database.

use cqa_common::config::LimitsConfig;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use super::file_discoverer::{DiscoveredFile, DiscoveryError, FileDiscoverer};
use super::reasoning::ReasoningClient;
use crate::models::{AnalysisKind, BatchResult, FileAnalysis, FileFailure, FileOutcome};

/// Batch precondition failures; no provider call has been made
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Too many files in batch: {count} (max {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Batch too large: {size} bytes (max {max} bytes)")]
    BatchTooLarge { size: u64, max: u64 },
}

/// Per-batch ceilings
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    pub max_batch_files: usize,
    pub max_batch_bytes: u64,
}

impl BatchLimits {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            max_batch_files: config.max_batch_files,
            max_batch_bytes: config.max_batch_bytes,
        }
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

/// Sequences per-file analysis calls for one project directory
#[derive(Clone)]
pub struct BatchOrchestrator {
    discoverer: FileDiscoverer,
    client: ReasoningClient,
    limits: BatchLimits,
}

impl BatchOrchestrator {
    pub fn new(discoverer: FileDiscoverer, client: ReasoningClient, limits: BatchLimits) -> Self {
        Self {
            discoverer,
            client,
            limits,
        }
    }

    pub fn client(&self) -> &ReasoningClient {
        &self.client
    }

    /// Analyze every eligible file under `project_dir`
    ///
    /// An empty `kinds` slice requests every analysis kind.
    pub async fn run(
        &self,
        project_dir: &Path,
        project_id: Uuid,
        kinds: &[AnalysisKind],
    ) -> Result<BatchResult, BatchError> {
        let discovery = self.discoverer.discover(project_dir)?;

        if discovery.files.len() > self.limits.max_batch_files {
            return Err(BatchError::TooManyFiles {
                count: discovery.files.len(),
                max: self.limits.max_batch_files,
            });
        }

        if discovery.total_size > self.limits.max_batch_bytes {
            return Err(BatchError::BatchTooLarge {
                size: discovery.total_size,
                max: self.limits.max_batch_bytes,
            });
        }

        let kinds = AnalysisKind::normalize(kinds);
        let batch_id = Uuid::new_v4();

        // Stable: discovery order is kept within each priority class
        let mut files = discovery.files;
        files.sort_by_key(|file| !file.is_priority);

        tracing::info!(
            project_id = %project_id,
            batch_id = %batch_id,
            files = files.len(),
            priority_files = discovery.priority_count,
            "Starting batch analysis"
        );

        let mut results = Vec::with_capacity(files.len());
        let mut successful = 0usize;
        let mut failed = 0usize;

        for (index, file) in files.iter().enumerate() {
            tracing::debug!(
                batch_id = %batch_id,
                file = %file.relative_path,
                index = index + 1,
                total = files.len(),
                "Analyzing file"
            );

            let outcome = self.analyze_file(file, &kinds).await;
            match &outcome {
                FileOutcome::Success(_) => successful += 1,
                FileOutcome::Failure(failure) => {
                    failed += 1;
                    tracing::warn!(
                        batch_id = %batch_id,
                        file = %failure.filename,
                        error = %failure.error,
                        "File analysis failed"
                    );
                }
            }
            results.push(outcome);
        }

        tracing::info!(
            project_id = %project_id,
            batch_id = %batch_id,
            successful,
            failed,
            "Batch analysis finished"
        );

        Ok(BatchResult {
            batch_id,
            project_id,
            total_files: files.len(),
            successful_analyses: successful,
            failed_analyses: failed,
            priority_files: discovery.priority_count,
            results,
        })
    }

    async fn analyze_file(&self, file: &DiscoveredFile, kinds: &[AnalysisKind]) -> FileOutcome {
        let failure = |error: String| {
            FileOutcome::Failure(FileFailure {
                filename: file.relative_path.clone(),
                error,
            })
        };

        let bytes = match tokio::fs::read(&file.absolute_path).await {
            Ok(bytes) => bytes,
            Err(e) => return failure(format!("Failed to read file: {}", e)),
        };

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => return failure("File is not valid UTF-8 text".to_string()),
        };

        match self
            .client
            .analyze(&content, &file.language, kinds, file.is_priority)
            .await
        {
            Ok(outcome) => FileOutcome::Success(FileAnalysis {
                filename: file.relative_path.clone(),
                language: file.language.clone(),
                size_bytes: file.size_bytes,
                is_priority: file.is_priority,
                model: outcome.model,
                analysis: outcome.report,
            }),
            Err(e) => failure(e.to_string()),
        }
    }
}
