//! Analytics endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{analytics, projects};
use crate::models::{ProjectAnalytics, Timeframe, UserProgress};
use crate::{ApiResult, AppState};

/// GET /projects/:id/analytics
pub async fn project_analytics(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectAnalytics>> {
    projects::require_project(&state.db, project_id).await?;
    let summary = analytics::project_analytics(&state.db, project_id).await?;
    Ok(Json(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressParams {
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// GET /users/:id/progress?timeframe=30d
pub async fn user_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ProgressParams>,
) -> ApiResult<Json<UserProgress>> {
    let progress = analytics::user_progress(&state.db, &user_id, params.timeframe).await?;
    Ok(Json(progress))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:id/analytics", get(project_analytics))
        .route("/users/:id/progress", get(user_progress))
}
