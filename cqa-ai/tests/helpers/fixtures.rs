//! Archive, config and pipeline fixtures

use cqa_ai::services::{ProjectRunner, ReasoningProvider};
use cqa_common::config::TomlConfig;
use cqa_common::db::init_memory_database;
use serde_json::json;
use sqlx::SqlitePool;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tempfile::TempDir;

/// Build an in-memory zip; names ending in `/` become directory entries
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// A well-formed provider reply with one issue
pub fn report_json(quality: f64, complexity: f64, security: f64) -> String {
    json!({
        "qualityScore": quality,
        "complexityScore": complexity,
        "securityScore": security,
        "issues": [{
            "type": "style",
            "severity": "low",
            "line": 3,
            "description": "Inconsistent naming",
            "suggestion": "Use camelCase"
        }],
        "strengths": ["Readable structure"],
        "suggestions": ["Add tests"],
        "learningRecommendations": [{"topic": "Testing", "priority": "high", "reason": "No tests found"}]
    })
    .to_string()
}

/// Defaults with a roomy rate limit and near-zero backoff
pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.rate_limit.max_requests = 1000;
    config.rate_limit.retry_delay_ms = 1;
    config
}

pub struct TestPipeline {
    pub db: SqlitePool,
    pub runner: ProjectRunner,
    /// Kept alive for the duration of the test
    pub root: TempDir,
}

pub async fn test_runner(config: &TomlConfig, provider: Arc<dyn ReasoningProvider>) -> TestPipeline {
    let db = init_memory_database().await.unwrap();
    let root = TempDir::new().unwrap();
    let runner = ProjectRunner::from_config(db.clone(), config, root.path().join("projects"), provider);
    TestPipeline { db, runner, root }
}
