//! Configuration loading and root folder resolution tests
//!
//! Tests that touch CQA_ROOT_FOLDER or CQA_CONFIG are marked #[serial] so
//! they never race on the process environment.

use cqa_common::config::{
    load_toml_config, resolve_config_path, resolve_root_folder, write_toml_config, RootFolder,
    TomlConfig, CONFIG_ENV_VAR, ROOT_FOLDER_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_cli_arg_wins_over_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/cqa-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cqa-toml-root")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/tmp/cqa-cli-root")), &config);
    assert_eq!(resolved, PathBuf::from("/tmp/cqa-cli-root"));

    env::remove_var(ROOT_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_env_wins_over_toml() {
    env::set_var(ROOT_FOLDER_ENV_VAR, "/tmp/cqa-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cqa-toml-root")),
        ..Default::default()
    };

    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/cqa-env-root")
    );

    env::remove_var(ROOT_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/cqa-toml-root")),
        ..Default::default()
    };
    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/cqa-toml-root")
    );

    let fallback = resolve_root_folder(None, &TomlConfig::default());
    assert!(!fallback.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_config_path_from_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/cqa-custom.toml");
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/cqa-custom.toml"))
    );
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(
        resolve_config_path(Some(Path::new("/tmp/explicit.toml"))),
        Some(PathBuf::from("/tmp/explicit.toml"))
    );
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_invalid_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[limits\nmax_file_bytes = ").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
fn test_write_then_load_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cqa-ai.toml");

    let mut config = TomlConfig::default();
    config.provider.api_key = Some("key-from-toml".to_string());
    config.limits.max_batch_files = 7;

    write_toml_config(&config, &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(loaded.provider.api_key.as_deref(), Some("key-from-toml"));
    assert_eq!(loaded.limits.max_batch_files, 7);
}

#[test]
fn test_root_folder_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = RootFolder::new(dir.path().join("cqa"));

    root.ensure_directories().unwrap();

    assert!(root.path().is_dir());
    assert!(root.projects_dir().is_dir());
}
