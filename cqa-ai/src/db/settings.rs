//! Settings database operations
//!
//! Key/value accessors over the `settings` table.

use cqa_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Settings key holding the reasoning provider API key
pub const PROVIDER_API_KEY: &str = "provider_api_key";

/// Get the reasoning provider API key, if stored
pub async fn get_provider_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, PROVIDER_API_KEY).await
}

/// Store the reasoning provider API key
pub async fn set_provider_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, PROVIDER_API_KEY, key).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
