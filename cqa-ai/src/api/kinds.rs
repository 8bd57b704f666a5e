//! Analysis kind catalogue

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::models::AnalysisKind;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisKindInfo {
    pub id: AnalysisKind,
    pub description: &'static str,
}

/// GET /analysis/kinds
pub async fn list_kinds() -> Json<Vec<AnalysisKindInfo>> {
    Json(
        AnalysisKind::ALL
            .iter()
            .map(|kind| AnalysisKindInfo {
                id: *kind,
                description: kind.description(),
            })
            .collect(),
    )
}

pub fn kind_routes() -> Router<AppState> {
    Router::new().route("/analysis/kinds", get(list_kinds))
}
