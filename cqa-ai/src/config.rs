//! Configuration resolution for cqa-ai
//!
//! Provider API key resolution with Database → ENV → TOML priority.

use cqa_common::config::TomlConfig;
use cqa_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Environment variable holding the provider API key
pub const API_KEY_ENV_VAR: &str = "CQA_PROVIDER_API_KEY";

/// Resolve the reasoning provider API key
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_provider_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<String> {
    let db_key = crate::db::settings::get_provider_api_key(db)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .provider
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| "database"),
        env_key.as_ref().map(|_| "environment"),
        toml_key.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "Provider API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("Provider API key loaded from database");
        return Ok(key);
    }

    if let Some(key) = env_key {
        info!("Provider API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Provider API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Provider API key not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: [provider] api_key = \"your-key\"",
        API_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
