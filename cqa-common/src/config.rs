//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a TOML file. Every field has a built-in
//! default, so a missing or partial file never prevents startup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "CQA_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "CQA_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder for the database and extracted projects
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
    pub limits: LimitsConfig,
    pub extensions: ExtensionsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// External reasoning provider (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Lowest-priority source for the API key (database and environment win)
    pub api_key: Option<String>,
    /// Model used for high-priority files
    pub preferred_model: String,
    /// Model used for everything else and as the retry fallback
    pub fallback_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-call timeout
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            preferred_model: "llama3-70b-8192".to_string(),
            fallback_model: "llama3-8b-8192".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            request_timeout_secs: 60,
        }
    }
}

/// Outbound call budget and retry policy
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls admitted per window
    pub max_requests: usize,
    pub window_ms: u64,
    /// Attempts per model before falling back
    pub max_retries: u32,
    /// Base backoff delay, doubled per attempt
    pub retry_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

/// Size ceilings and persistence timing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_file_bytes: u64,
    pub max_batch_files: usize,
    pub max_batch_bytes: u64,
    /// Archive entries larger than this are not extracted
    pub max_archive_entry_bytes: u64,
    /// Upper bound on retrying "database is locked" errors
    pub db_max_lock_wait_ms: u64,
    /// Timeout applied to each persistence call
    pub persist_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 50_000,
            max_batch_files: 50,
            max_batch_bytes: 500_000,
            max_archive_entry_bytes: 1_048_576,
            db_max_lock_wait_ms: 5_000,
            persist_timeout_ms: 10_000,
        }
    }
}

/// File extension allowlists (lower-case, without the dot)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub supported: Vec<String>,
    pub priority: Vec<String>,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        let defaults = vec!["js".to_string(), "jsx".to_string(), "py".to_string()];
        Self {
            supported: defaults.clone(),
            priority: defaults,
        }
    }
}

/// Locate the TOML config file
///
/// Priority: explicit path → `CQA_CONFIG` → `<config dir>/cqa/cqa-ai.toml`
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("cqa").join("cqa-ai.toml"))
}

/// Load TOML config, falling back to defaults when the file is missing
///
/// A file that exists but cannot be parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write TOML config, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    // Write-then-rename keeps the replacement atomic
    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. `CQA_ROOT_FOLDER` environment variable
/// 3. TOML `root_folder`
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cqa"))
        .unwrap_or_else(|| PathBuf::from("./cqa_data"))
}

/// Paths derived from the root folder
#[derive(Debug, Clone)]
pub struct RootFolder {
    root: PathBuf,
}

impl RootFolder {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root folder and the projects directory if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.projects_dir())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join("cqa.db")
    }

    /// Base directory holding one extraction directory per project
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }
}
