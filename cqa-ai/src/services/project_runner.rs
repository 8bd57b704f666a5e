//! Project runner
//!
//! Ties the pipeline to storage: archive ingest registers source files,
//! batch runs drive the project status machine and persist every
//! successful analysis. Persistence failures are collected per file; earlier
//! inserts are never rolled back.
//!
//! A project never stays PROCESSING once its run is over: the run executes
//! on its own task, every error after `begin_batch` marks the project
//! FAILED, and runs cut short by a restart are failed at startup.

use cqa_common::config::{LimitsConfig, TomlConfig};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::archive_extractor::{ArchiveExtractor, ExtractError, ExtractionReport};
use super::batch_orchestrator::{BatchError, BatchLimits, BatchOrchestrator};
use super::extension_policy::ExtensionPolicy;
use super::file_discoverer::FileDiscoverer;
use super::reasoning::{
    ReasoningClient, ReasoningProvider, ReasoningSettings, SlidingWindowRateLimiter,
};
use crate::db::{assessments, files, projects};
use crate::models::{
    AnalysisKind, Assessment, BatchResult, FileAnalysis, FileFailure, NewAssessment,
    NewSourceFile, Project, ProjectStatus, SourceFile,
};
use crate::utils::persist_with_retry;

/// Runner errors; raised only when nothing (or nothing further) can be done
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Project {0} is archived")]
    Archived(Uuid),

    #[error("Project {0} already has a batch in progress")]
    AlreadyProcessing(Uuid),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Common(#[from] cqa_common::Error),
}

/// Lock-retry and timeout bounds for each persistence call
#[derive(Debug, Clone, Copy)]
pub struct PersistenceSettings {
    pub max_lock_wait_ms: u64,
    pub timeout: Duration,
}

impl PersistenceSettings {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            max_lock_wait_ms: config.db_max_lock_wait_ms,
            timeout: Duration::from_millis(config.persist_timeout_ms),
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

/// Outcome of one batch run against a stored project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRunReport {
    pub batch: BatchResult,
    pub persisted_assessments: Vec<Assessment>,
    pub persistence_failures: Vec<FileFailure>,
    pub status: ProjectStatus,
}

#[derive(Clone)]
pub struct ProjectRunner {
    db: SqlitePool,
    extractor: ArchiveExtractor,
    orchestrator: BatchOrchestrator,
    persistence: PersistenceSettings,
}

impl ProjectRunner {
    pub fn new(
        db: SqlitePool,
        extractor: ArchiveExtractor,
        orchestrator: BatchOrchestrator,
        persistence: PersistenceSettings,
    ) -> Self {
        Self {
            db,
            extractor,
            orchestrator,
            persistence,
        }
    }

    /// Assemble the whole pipeline from configuration
    ///
    /// One rate limiter is created here and shared by every batch the runner executes.
    pub fn from_config(
        db: SqlitePool,
        config: &TomlConfig,
        projects_dir: PathBuf,
        provider: Arc<dyn ReasoningProvider>,
    ) -> Self {
        let policy = ExtensionPolicy::from_config(&config.extensions);
        let limiter = Arc::new(SlidingWindowRateLimiter::from_config(&config.rate_limit));
        let client = ReasoningClient::new(provider, limiter, ReasoningSettings::from_config(config));
        let orchestrator = BatchOrchestrator::new(
            FileDiscoverer::new(policy.clone()),
            client,
            BatchLimits::from_config(&config.limits),
        );

        Self::new(
            db,
            ArchiveExtractor::new(projects_dir, policy, config.limits.max_archive_entry_bytes),
            orchestrator,
            PersistenceSettings::from_config(&config.limits),
        )
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    async fn require_active_project(&self, project_id: Uuid) -> Result<Project, RunError> {
        let project = projects::require_project(&self.db, project_id).await?;
        if project.status == ProjectStatus::Archived {
            return Err(RunError::Archived(project_id));
        }
        Ok(project)
    }

    /// Extract an uploaded archive into the project directory and register its files
    ///
    /// Rejected while a batch is running, since the upload replaces the directory.
    pub async fn ingest_archive(
        &self,
        project_id: Uuid,
        bytes: Vec<u8>,
    ) -> Result<ExtractionReport, RunError> {
        let project = self.require_active_project(project_id).await?;
        if project.status == ProjectStatus::Processing {
            return Err(RunError::AlreadyProcessing(project_id));
        }

        let extractor = self.extractor.clone();
        let report = tokio::task::spawn_blocking(move || extractor.extract_bytes(&bytes, project_id))
            .await
            .map_err(|e| cqa_common::Error::Internal(format!("Extraction task failed: {}", e)))??;

        let mut registered = Vec::with_capacity(report.files.len());
        for file in &report.files {
            let path = report.project_dir.join(&file.filename);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(
                        project_id = %project_id,
                        file = %file.filename,
                        error = %e,
                        "Extracted file is not readable text, not registered"
                    );
                    continue;
                }
            };

            let new_file = NewSourceFile {
                project_id,
                filename: file.filename.clone(),
                language: file.language.clone(),
                content,
            };
            self.register(&new_file).await?;
            registered.push(file.filename.clone());
        }

        // The upload replaced the directory; earlier files are no longer current
        files::retire_source_files_except(&self.db, project_id, &registered).await?;

        let total = files::list_source_files(&self.db, project_id).await?.len() as i64;
        projects::update_total_files(&self.db, project_id, total).await?;

        tracing::info!(
            project_id = %project_id,
            extracted = report.extracted_count,
            skipped = report.skipped.len(),
            total_files = total,
            "Archive ingested"
        );

        Ok(report)
    }

    /// Analyze the project directory and persist the results
    ///
    /// An empty `kinds` slice requests every analysis kind. Once the project
    /// is PROCESSING the run continues on its own task, so dropping the
    /// returned future does not abandon it.
    pub async fn run_batch(
        &self,
        project_id: Uuid,
        kinds: &[AnalysisKind],
    ) -> Result<BatchRunReport, RunError> {
        let project = self.require_active_project(project_id).await?;
        if project.status == ProjectStatus::Processing {
            return Err(RunError::AlreadyProcessing(project_id));
        }

        projects::begin_batch(&self.db, project_id).await?;

        let runner = self.clone();
        let kinds = kinds.to_vec();
        let handle = tokio::spawn(async move {
            let result = runner.process_batch(project_id, &kinds).await;
            if let Err(e) = &result {
                tracing::warn!(project_id = %project_id, error = %e, "Batch run failed");
                runner.mark_failed(project_id).await;
            }
            result
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                self.mark_failed(project_id).await;
                Err(cqa_common::Error::Internal(format!("Batch task failed: {}", e)).into())
            }
        }
    }

    /// Fail every project left PROCESSING by an earlier process
    ///
    /// Meant for startup, before any batch can begin. Returns the recovered ids.
    pub async fn recover_interrupted_batches(&self) -> Result<Vec<Uuid>, RunError> {
        let stuck = projects::list_projects_by_status(&self.db, ProjectStatus::Processing).await?;

        let mut recovered = Vec::with_capacity(stuck.len());
        for project in stuck {
            projects::update_status(&self.db, project.project_id, ProjectStatus::Failed).await?;
            tracing::warn!(project_id = %project.project_id, "Interrupted batch marked FAILED");
            recovered.push(project.project_id);
        }
        Ok(recovered)
    }

    async fn process_batch(
        &self,
        project_id: Uuid,
        kinds: &[AnalysisKind],
    ) -> Result<BatchRunReport, RunError> {
        let project_dir = self.extractor.project_dir(project_id);
        let batch = self.orchestrator.run(&project_dir, project_id, kinds).await?;

        let kinds = AnalysisKind::normalize(kinds);
        let analysis_type = kinds
            .first()
            .copied()
            .unwrap_or(AnalysisKind::CodeQuality);

        let mut persisted_assessments = Vec::new();
        let mut persistence_failures = Vec::new();

        for analysis in batch.successes() {
            match self.persist_analysis(project_id, analysis_type, analysis).await {
                Ok(assessment) => persisted_assessments.push(assessment),
                Err(e) => {
                    tracing::error!(
                        project_id = %project_id,
                        file = %analysis.filename,
                        error = %e,
                        "Failed to persist assessment"
                    );
                    persistence_failures.push(FileFailure {
                        filename: analysis.filename.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let failures = batch.failed_analyses + persistence_failures.len();
        let project = projects::finish_batch(&self.db, project_id, failures).await?;

        tracing::info!(
            project_id = %project_id,
            batch_id = %batch.batch_id,
            persisted = persisted_assessments.len(),
            failures,
            status = %project.status,
            "Batch run finished"
        );

        Ok(BatchRunReport {
            batch,
            persisted_assessments,
            persistence_failures,
            status: project.status,
        })
    }

    /// PROCESSING → FAILED if the project is still processing
    async fn mark_failed(&self, project_id: Uuid) {
        let result = match projects::get_project(&self.db, project_id).await {
            Ok(Some(project)) if project.status == ProjectStatus::Processing => {
                projects::update_status(&self.db, project_id, ProjectStatus::Failed)
                    .await
                    .map(|_| ())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::error!(project_id = %project_id, error = %e, "Failed to mark project FAILED");
        }
    }

    /// Archive (soft) or delete (hard) a project; a hard delete also removes its files on disk
    pub async fn remove_project(&self, project_id: Uuid, hard: bool) -> Result<(), RunError> {
        if !hard {
            projects::archive_project(&self.db, project_id).await?;
            return Ok(());
        }

        projects::delete_project(&self.db, project_id).await?;

        let dir = self.extractor.project_dir(project_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(project_id = %project_id, error = %e, "Failed to remove project directory");
            }
        }
        Ok(())
    }

    async fn persist_analysis(
        &self,
        project_id: Uuid,
        analysis_type: AnalysisKind,
        analysis: &FileAnalysis,
    ) -> cqa_common::Result<Assessment> {
        let source_file = match files::find_source_file(&self.db, project_id, &analysis.filename).await? {
            Some(file) => file,
            None => {
                let path = self.extractor.project_dir(project_id).join(&analysis.filename);
                let content = tokio::fs::read_to_string(&path).await?;
                self.register(&NewSourceFile {
                    project_id,
                    filename: analysis.filename.clone(),
                    language: analysis.language.clone(),
                    content,
                })
                .await?
            }
        };

        let input = NewAssessment::from_report(
            source_file.file_id,
            project_id,
            analysis_type.as_str(),
            &analysis.analysis,
        );

        let db = &self.db;
        let input = &input;
        persist_with_retry(
            "create_assessment",
            self.persistence.max_lock_wait_ms,
            self.persistence.timeout,
            || assessments::create_assessment(db, input),
        )
        .await
    }

    async fn register(&self, new_file: &NewSourceFile) -> cqa_common::Result<SourceFile> {
        let db = &self.db;
        persist_with_retry(
            "register_source_file",
            self.persistence.max_lock_wait_ms,
            self.persistence.timeout,
            || files::register_source_file(db, new_file),
        )
        .await
    }
}
