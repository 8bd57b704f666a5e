//! Extension allowlist shared by archive extraction and batch discovery
//!
//! One policy instance decides which files are analyzable, which are
//! high priority, and which language a file is written in.

use cqa_common::config::ExtensionsConfig;
use std::collections::HashSet;
use std::path::Path;

/// Directories never descended into during discovery
pub const SKIPPED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".vscode",
    ".idea",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".venv",
    "venv",
];

/// Supported and priority extension sets (lower-case, no leading dot)
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    supported: HashSet<String>,
    priority: HashSet<String>,
}

impl ExtensionPolicy {
    pub fn new<S, P>(supported: S, priority: P) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            supported: supported.into_iter().map(|e| normalize_extension(e.as_ref())).collect(),
            priority: priority.into_iter().map(|e| normalize_extension(e.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &ExtensionsConfig) -> Self {
        Self::new(&config.supported, &config.priority)
    }

    /// Lower-cased extension of `path`, if any
    pub fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        Self::extension_of(path)
            .map(|ext| self.supported.contains(&ext))
            .unwrap_or(false)
    }

    pub fn is_priority(&self, path: &Path) -> bool {
        Self::extension_of(path)
            .map(|ext| self.priority.contains(&ext))
            .unwrap_or(false)
    }

    pub fn is_skipped_directory(name: &str) -> bool {
        SKIPPED_DIRECTORIES.contains(&name)
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::from_config(&ExtensionsConfig::default())
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Language name for a file, by extension
pub fn detect_language(path: &Path) -> &'static str {
    match ExtensionPolicy::extension_of(path).as_deref() {
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("py") => "python",
        Some("java") => "java",
        Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") => "cpp",
        Some("c") | Some("h") => "c",
        Some("cs") => "csharp",
        Some("php") => "php",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("swift") => "swift",
        Some("kt") => "kotlin",
        Some("scala") => "scala",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ExtensionPolicy::default();
        assert!(policy.is_supported(Path::new("src/app.js")));
        assert!(policy.is_supported(Path::new("App.JSX")));
        assert!(policy.is_supported(Path::new("main.py")));
        assert!(!policy.is_supported(Path::new("readme.md")));
        assert!(!policy.is_supported(Path::new("Makefile")));
        assert!(policy.is_priority(Path::new("main.py")));
    }

    #[test]
    fn test_custom_policy_normalizes_input() {
        let policy = ExtensionPolicy::new([".TS", "js"], ["ts"]);
        assert!(policy.is_supported(Path::new("index.ts")));
        assert!(policy.is_priority(Path::new("index.ts")));
        assert!(!policy.is_priority(Path::new("index.js")));
        assert!(policy.is_supported(Path::new("index.js")));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("a.jsx")), "javascript");
        assert_eq!(detect_language(Path::new("b.py")), "python");
        assert_eq!(detect_language(Path::new("c.rs")), "rust");
        assert_eq!(detect_language(Path::new("notes.txt")), "unknown");
        assert_eq!(detect_language(Path::new("LICENSE")), "unknown");
    }

    #[test]
    fn test_skipped_directories() {
        assert!(ExtensionPolicy::is_skipped_directory("node_modules"));
        assert!(ExtensionPolicy::is_skipped_directory(".git"));
        assert!(!ExtensionPolicy::is_skipped_directory("src"));
    }
}
