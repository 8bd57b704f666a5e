//! Shared fixtures for cqa-ai integration tests

#![allow(dead_code)]

pub mod fake_provider;
pub mod fixtures;

pub use fake_provider::ScriptedProvider;
pub use fixtures::{report_json, test_config, test_runner, zip_archive, TestPipeline};
