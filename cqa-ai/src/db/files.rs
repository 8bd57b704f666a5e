//! Source file database operations
//!
//! Records are immutable. Each (project, filename) has at most one current
//! record; registering different content for it supersedes that record and
//! inserts a new one, so earlier assessments keep pointing at the version
//! they analyzed.

use std::collections::HashSet;

use cqa_common::time::{now_secs, parse_db_timestamp, to_db_timestamp};
use cqa_common::{Error, Result};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;
use crate::models::{NewSourceFile, SourceFile};

/// Hex-encoded SHA-256 of file content
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Register `new_file` as the current version of its filename
///
/// Identical content returns the current record unchanged.
pub async fn register_source_file(pool: &SqlitePool, new_file: &NewSourceFile) -> Result<SourceFile> {
    let filename = new_file.filename.trim();
    if filename.is_empty() {
        return Err(Error::InvalidInput("Filename is required".to_string()));
    }

    let hash = content_hash(new_file.content.as_bytes());
    let now = to_db_timestamp(now_secs());
    let mut tx = pool.begin().await?;

    let current: Option<(String, String)> = sqlx::query_as(
        r#"
        SELECT file_id, content_hash FROM source_files
        WHERE project_id = ? AND filename = ? AND superseded_at IS NULL
        "#,
    )
    .bind(new_file.project_id.to_string())
    .bind(filename)
    .fetch_optional(&mut *tx)
    .await?;

    match current {
        Some((_, existing_hash)) if existing_hash == hash => {
            tracing::debug!(
                project_id = %new_file.project_id,
                file = %filename,
                "Source file already registered"
            );
        }
        current => {
            if let Some((file_id, _)) = current {
                sqlx::query("UPDATE source_files SET superseded_at = ? WHERE file_id = ?")
                    .bind(&now)
                    .bind(&file_id)
                    .execute(&mut *tx)
                    .await?;
                tracing::info!(
                    project_id = %new_file.project_id,
                    file = %filename,
                    superseded = %file_id,
                    "Source file content changed"
                );
            }

            sqlx::query(
                r#"
                INSERT INTO source_files (
                    file_id, project_id, filename, language, size_bytes, content_hash, content, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(new_file.project_id.to_string())
            .bind(filename)
            .bind(&new_file.language)
            .bind(new_file.content.len() as i64)
            .bind(&hash)
            .bind(&new_file.content)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    find_source_file(pool, new_file.project_id, filename)
        .await?
        .ok_or_else(|| Error::Internal(format!("Source file {} vanished after insert", filename)))
}

/// Supersede every current file of the project whose name is not in `keep`
///
/// Returns how many records were retired.
pub async fn retire_source_files_except(
    pool: &SqlitePool,
    project_id: Uuid,
    keep: &[String],
) -> Result<usize> {
    let keep: HashSet<&str> = keep.iter().map(String::as_str).collect();
    let now = to_db_timestamp(now_secs());
    let mut retired = 0;

    for file in list_source_files(pool, project_id).await? {
        if keep.contains(file.filename.as_str()) {
            continue;
        }
        sqlx::query(
            "UPDATE source_files SET superseded_at = ? WHERE file_id = ? AND superseded_at IS NULL",
        )
        .bind(&now)
        .bind(file.file_id.to_string())
        .execute(pool)
        .await?;
        retired += 1;
    }

    if retired > 0 {
        tracing::info!(project_id = %project_id, retired, "Retired source files missing from upload");
    }
    Ok(retired)
}

/// Look up a file by project and filename
pub async fn find_source_file(
    pool: &SqlitePool,
    project_id: Uuid,
    filename: &str,
) -> Result<Option<SourceFile>> {
    let row = sqlx::query(
        r#"
        SELECT file_id, project_id, filename, language, size_bytes, content_hash, content, created_at
        FROM source_files
        WHERE project_id = ? AND filename = ? AND superseded_at IS NULL
        "#,
    )
    .bind(project_id.to_string())
    .bind(filename)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(|r| row_to_source_file(r, true)).transpose()
}

/// Current files of a project ordered by filename, without content
pub async fn list_source_files(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<SourceFile>> {
    let rows = sqlx::query(
        r#"
        SELECT file_id, project_id, filename, language, size_bytes, content_hash, NULL AS content, created_at
        FROM source_files
        WHERE project_id = ? AND superseded_at IS NULL
        ORDER BY filename
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(|r| row_to_source_file(r, false)).collect()
}

fn row_to_source_file(row: &SqliteRow, with_content: bool) -> Result<SourceFile> {
    Ok(SourceFile {
        file_id: parse_uuid(row.get("file_id"), "file_id")?,
        project_id: parse_uuid(row.get("project_id"), "project_id")?,
        filename: row.get("filename"),
        language: row.get("language"),
        size_bytes: row.get("size_bytes"),
        content_hash: row.get("content_hash"),
        content: if with_content { row.get("content") } else { None },
        created_at: parse_db_timestamp(row.get("created_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::projects::create_project;
    use crate::models::NewProject;
    use cqa_common::db::init_memory_database;

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(
            &pool,
            &NewProject {
                owner_id: "u".to_string(),
                name: "p".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        (pool, project.project_id)
    }

    fn new_file(project_id: Uuid, filename: &str, content: &str) -> NewSourceFile {
        NewSourceFile {
            project_id,
            filename: filename.to_string(),
            language: "javascript".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_register_same_content_is_idempotent() {
        let (pool, project_id) = setup().await;

        let first = register_source_file(&pool, &new_file(project_id, "a.js", "let a;")).await.unwrap();
        let second = register_source_file(&pool, &new_file(project_id, "a.js", "let a;")).await.unwrap();

        assert_eq!(first.file_id, second.file_id);
        assert_eq!(second.size_bytes, 6);
    }

    #[tokio::test]
    async fn test_changed_content_supersedes_previous_version() {
        let (pool, project_id) = setup().await;

        let first = register_source_file(&pool, &new_file(project_id, "a.js", "let a;")).await.unwrap();
        let second = register_source_file(&pool, &new_file(project_id, "a.js", "let a = 2;"))
            .await
            .unwrap();

        assert_ne!(first.file_id, second.file_id);
        assert_eq!(second.content.as_deref(), Some("let a = 2;"));
        assert_eq!(second.size_bytes, 10);

        let current = find_source_file(&pool, project_id, "a.js").await.unwrap().unwrap();
        assert_eq!(current.file_id, second.file_id);
        assert_eq!(list_source_files(&pool, project_id).await.unwrap().len(), 1);

        let old_content: Option<String> =
            sqlx::query_scalar("SELECT content FROM source_files WHERE file_id = ?")
                .bind(first.file_id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(old_content.as_deref(), Some("let a;"));
    }

    #[tokio::test]
    async fn test_retire_files_missing_from_upload() {
        let (pool, project_id) = setup().await;
        register_source_file(&pool, &new_file(project_id, "a.js", "a")).await.unwrap();
        register_source_file(&pool, &new_file(project_id, "b.js", "b")).await.unwrap();

        let retired = retire_source_files_except(&pool, project_id, &["a.js".to_string()])
            .await
            .unwrap();

        assert_eq!(retired, 1);
        let names: Vec<String> = list_source_files(&pool, project_id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.filename)
            .collect();
        assert_eq!(names, vec!["a.js"]);
        assert!(find_source_file(&pool, project_id, "b.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_source_files_omits_content() {
        let (pool, project_id) = setup().await;
        register_source_file(&pool, &new_file(project_id, "b.js", "b")).await.unwrap();
        register_source_file(&pool, &new_file(project_id, "a.js", "a")).await.unwrap();

        let files = list_source_files(&pool, project_id).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.js", "b.js"]);
        assert!(files.iter().all(|f| f.content.is_none()));
    }

    #[tokio::test]
    async fn test_register_for_missing_project_fails() {
        let (pool, _) = setup().await;
        let result = register_source_file(&pool, &new_file(Uuid::new_v4(), "a.js", "x")).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
