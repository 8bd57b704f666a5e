//! Archive upload endpoint

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::services::ExtractionReport;
use crate::{ApiError, ApiResult, AppState};

/// Upper bound on an uploaded zip body
pub const MAX_ARCHIVE_BYTES: usize = 50 * 1024 * 1024;

/// POST /projects/:id/archive
///
/// Body is the raw zip archive.
pub async fn upload_archive(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<ExtractionReport>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Archive body is empty".to_string()));
    }

    match state.runner.ingest_archive(project_id, body.to_vec()).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            state
                .record_error(format!("Archive ingest for {} failed: {}", project_id, e))
                .await;
            Err(e.into())
        }
    }
}

pub fn archive_routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:id/archive", post(upload_archive))
        .layer(DefaultBodyLimit::max(MAX_ARCHIVE_BYTES))
}
