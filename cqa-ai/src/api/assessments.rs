//! Assessment endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{assessments, projects};
use crate::models::{Assessment, AssessmentQuery, AssessmentUpdate};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentPage {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub assessments: Vec<Assessment>,
}

/// GET /projects/:id/assessments
pub async fn list_project_assessments(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<AssessmentQuery>,
) -> ApiResult<Json<AssessmentPage>> {
    projects::require_project(&state.db, project_id).await?;

    let items = assessments::list_assessments_for_project(&state.db, project_id, &query).await?;
    let total = assessments::count_assessments_for_project(&state.db, project_id).await?;

    Ok(Json(AssessmentPage {
        total,
        limit: query.limit,
        offset: query.offset,
        assessments: items,
    }))
}

/// GET /assessments/:id
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> ApiResult<Json<Assessment>> {
    assessments::get_assessment(&state.db, assessment_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Assessment {}", assessment_id)))
}

/// PATCH /assessments/:id
pub async fn update_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
    Json(update): Json<AssessmentUpdate>,
) -> ApiResult<Json<Assessment>> {
    let assessment = assessments::update_assessment(&state.db, assessment_id, &update).await?;
    Ok(Json(assessment))
}

pub fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:id/assessments", get(list_project_assessments))
        .route("/assessments/:id", get(get_assessment).patch(update_assessment))
}
