//! Source file model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file registered under a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub file_id: Uuid,
    pub project_id: Uuid,
    /// Path relative to the project directory
    pub filename: String,
    pub language: String,
    pub size_bytes: i64,
    /// SHA-256 of the content, hex encoded
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a source file
#[derive(Debug, Clone)]
pub struct NewSourceFile {
    pub project_id: Uuid,
    pub filename: String,
    pub language: String,
    pub content: String,
}
