//! Project endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::projects;
use crate::models::{NewProject, Project, ProjectStatus};
use crate::{ApiError, ApiResult, AppState};

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = projects::create_project(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    projects::get_project(&state.db, project_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Project {}", project_id)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

/// DELETE /projects/:id
///
/// Archives by default; `?hard=true` removes the project, its files and assessments.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<StatusCode> {
    state.runner.remove_project(project_id, params.hard).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub status: Option<ProjectStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// GET /users/:id/projects
pub async fn list_user_projects(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = projects::list_projects_for_owner(
        &state.db,
        &user_id,
        params.status,
        params.limit,
        params.offset,
    )
    .await?;
    Ok(Json(projects))
}

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/:id", get(get_project).delete(delete_project))
        .route("/users/:id/projects", get(list_user_projects))
}
