//! Utility functions

pub mod db_retry;

pub use db_retry::{persist_with_retry, retry_on_lock};
