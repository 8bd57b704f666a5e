//! # CQA Common Library
//!
//! Shared code for the code quality assessment services:
//! - Error type used across crates
//! - TOML configuration and root folder resolution
//! - Database bootstrap and schema

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
