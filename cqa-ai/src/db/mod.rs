//! Database access for the analysis service

pub mod analytics;
pub mod assessments;
pub mod files;
pub mod projects;
pub mod settings;

use cqa_common::{Error, Result};
use uuid::Uuid;

/// Parse a UUID stored as text
pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Failed to parse {} '{}': {}", column, value, e)))
}

/// Serialize a list column as JSON text
pub(crate) fn to_json<T: serde::Serialize>(value: &T, column: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize {}: {}", column, e)))
}

/// Deserialize a JSON list column
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(value: &str, column: &str) -> Result<T> {
    serde_json::from_str(value)
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", column, e)))
}
