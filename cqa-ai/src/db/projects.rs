//! Project database operations
//!
//! Status changes go through [`update_status`], which enforces the project
//! state machine with a compare-and-set on the current status.

use chrono::Utc;
use cqa_common::time::{now_secs, parse_db_timestamp, to_db_timestamp};
use cqa_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;
use crate::models::{NewProject, Project, ProjectStatus};

const PROJECT_COLUMNS: &str =
    "project_id, owner_id, name, description, status, total_files, created_at, updated_at";

/// Create a project in PENDING status
pub async fn create_project(pool: &SqlitePool, new_project: &NewProject) -> Result<Project> {
    let owner_id = new_project.owner_id.trim();
    let name = new_project.name.trim();

    if owner_id.is_empty() {
        return Err(Error::InvalidInput("Owner ID is required".to_string()));
    }
    if name.is_empty() {
        return Err(Error::InvalidInput("Project name is required".to_string()));
    }

    let now = now_secs();
    let project = Project {
        project_id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        description: new_project
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        status: ProjectStatus::Pending,
        total_files: 0,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO projects (
            project_id, owner_id, name, description, status, total_files, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project.project_id.to_string())
    .bind(&project.owner_id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.status.as_str())
    .bind(project.total_files)
    .bind(to_db_timestamp(project.created_at))
    .bind(to_db_timestamp(project.updated_at))
    .execute(pool)
    .await?;

    tracing::info!(project_id = %project.project_id, owner_id = %project.owner_id, "Project created");

    Ok(project)
}

/// Load a project
pub async fn get_project(pool: &SqlitePool, project_id: Uuid) -> Result<Option<Project>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM projects WHERE project_id = ?",
        PROJECT_COLUMNS
    ))
    .bind(project_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_project).transpose()
}

/// Load a project or fail with `NotFound`
pub async fn require_project(pool: &SqlitePool, project_id: Uuid) -> Result<Project> {
    get_project(pool, project_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project {}", project_id)))
}

/// Projects of one owner, newest first
pub async fn list_projects_for_owner(
    pool: &SqlitePool,
    owner_id: &str,
    status: Option<ProjectStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM projects
        WHERE owner_id = ? AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC, project_id
        LIMIT ? OFFSET ?
        "#,
        PROJECT_COLUMNS
    ))
    .bind(owner_id)
    .bind(status.map(|s| s.as_str()))
    .bind(status.map(|s| s.as_str()))
    .bind(limit.clamp(1, 500))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_project).collect()
}

/// All projects currently in `status`, oldest first
pub async fn list_projects_by_status(
    pool: &SqlitePool,
    status: ProjectStatus,
) -> Result<Vec<Project>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM projects WHERE status = ? ORDER BY created_at",
        PROJECT_COLUMNS
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_project).collect()
}

/// Move a project to `next`, rejecting transitions the state machine forbids
pub async fn update_status(
    pool: &SqlitePool,
    project_id: Uuid,
    next: ProjectStatus,
) -> Result<Project> {
    let current = require_project(pool, project_id).await?;

    if !current.status.can_transition_to(next) {
        return Err(Error::InvalidInput(format!(
            "Invalid status transition for project {}: {} -> {}",
            project_id, current.status, next
        )));
    }

    let result = sqlx::query(
        "UPDATE projects SET status = ?, updated_at = ? WHERE project_id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(to_db_timestamp(Utc::now()))
    .bind(project_id.to_string())
    .bind(current.status.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::InvalidInput(format!(
            "Project {} changed status concurrently",
            project_id
        )));
    }

    tracing::info!(
        project_id = %project_id,
        from = %current.status,
        to = %next,
        "Project status updated"
    );

    require_project(pool, project_id).await
}

/// PENDING/COMPLETED/FAILED → PROCESSING
pub async fn begin_batch(pool: &SqlitePool, project_id: Uuid) -> Result<Project> {
    update_status(pool, project_id, ProjectStatus::Processing).await
}

/// PROCESSING → COMPLETED when `failures == 0`, else FAILED
pub async fn finish_batch(pool: &SqlitePool, project_id: Uuid, failures: usize) -> Result<Project> {
    update_status(pool, project_id, ProjectStatus::from_batch_outcome(failures)).await
}

/// Soft delete
pub async fn archive_project(pool: &SqlitePool, project_id: Uuid) -> Result<Project> {
    update_status(pool, project_id, ProjectStatus::Archived).await
}

/// Hard delete; files and assessments go with it
pub async fn delete_project(pool: &SqlitePool, project_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM projects WHERE project_id = ?")
        .bind(project_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Project {}", project_id)));
    }

    tracing::info!(project_id = %project_id, "Project deleted");
    Ok(())
}

pub async fn update_total_files(pool: &SqlitePool, project_id: Uuid, total_files: i64) -> Result<()> {
    if total_files < 0 {
        return Err(Error::InvalidInput("File count cannot be negative".to_string()));
    }

    let result = sqlx::query("UPDATE projects SET total_files = ?, updated_at = ? WHERE project_id = ?")
        .bind(total_files)
        .bind(to_db_timestamp(Utc::now()))
        .bind(project_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Project {}", project_id)));
    }

    Ok(())
}

fn row_to_project(row: &SqliteRow) -> Result<Project> {
    let status: String = row.get("status");
    let status = status.parse::<ProjectStatus>().map_err(Error::Internal)?;

    Ok(Project {
        project_id: parse_uuid(row.get("project_id"), "project_id")?,
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        status,
        total_files: row.get("total_files"),
        created_at: parse_db_timestamp(row.get("created_at"))?,
        updated_at: parse_db_timestamp(row.get("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqa_common::db::init_memory_database;

    fn new_project(owner: &str, name: &str) -> NewProject {
        NewProject {
            owner_id: owner.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_project_starts_pending() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, &new_project("user-1", " Demo ")).await.unwrap();

        assert_eq!(project.status, ProjectStatus::Pending);
        assert_eq!(project.name, "Demo");

        let loaded = require_project(&pool, project.project_id).await.unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_create_project_requires_owner_and_name() {
        let pool = init_memory_database().await.unwrap();
        assert!(matches!(
            create_project(&pool, &new_project("", "x")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            create_project(&pool, &new_project("u", "  ")).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, &new_project("u", "p")).await.unwrap();

        let result = update_status(&pool, project.project_id, ProjectStatus::Completed).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let archived = archive_project(&pool, project.project_id).await.unwrap();
        assert_eq!(archived.status, ProjectStatus::Archived);
        assert!(begin_batch(&pool, project.project_id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_projects_for_owner_filters_status() {
        let pool = init_memory_database().await.unwrap();
        let a = create_project(&pool, &new_project("owner", "a")).await.unwrap();
        create_project(&pool, &new_project("owner", "b")).await.unwrap();
        create_project(&pool, &new_project("someone-else", "c")).await.unwrap();
        archive_project(&pool, a.project_id).await.unwrap();

        let all = list_projects_for_owner(&pool, "owner", None, 50, 0).await.unwrap();
        assert_eq!(all.len(), 2);

        let pending = list_projects_for_owner(&pool, "owner", Some(ProjectStatus::Pending), 50, 0)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "b");

        let archived = list_projects_by_status(&pool, ProjectStatus::Archived).await.unwrap();
        assert_eq!(archived.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_project() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, &new_project("u", "p")).await.unwrap();

        delete_project(&pool, project.project_id).await.unwrap();
        assert!(get_project(&pool, project.project_id).await.unwrap().is_none());
        assert!(matches!(
            delete_project(&pool, project.project_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_total_files() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, &new_project("u", "p")).await.unwrap();

        update_total_files(&pool, project.project_id, 3).await.unwrap();
        assert_eq!(require_project(&pool, project.project_id).await.unwrap().total_files, 3);
        assert!(update_total_files(&pool, Uuid::new_v4(), 1).await.is_err());
    }
}
