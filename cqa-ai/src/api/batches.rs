//! Batch analysis endpoint

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::AnalysisKind;
use crate::services::BatchRunReport;
use crate::{ApiResult, AppState};

/// Batch request; no body or an empty list requests every kind
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub analysis_types: Vec<AnalysisKind>,
}

/// POST /projects/:id/batch
///
/// Returns the full report once every file is done. A dropped connection
/// does not stop the run.
pub async fn run_batch(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    payload: Option<Json<BatchRequest>>,
) -> ApiResult<Json<BatchRunReport>> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    match state.runner.run_batch(project_id, &request.analysis_types).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            state
                .record_error(format!("Batch for {} failed: {}", project_id, e))
                .await;
            Err(e.into())
        }
    }
}

pub fn batch_routes() -> Router<AppState> {
    Router::new().route("/projects/:id/batch", post(run_batch))
}
