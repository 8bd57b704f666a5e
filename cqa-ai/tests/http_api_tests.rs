//! HTTP routing and handler tests through `tower::ServiceExt::oneshot`

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cqa_ai::{build_router, AppState};
use helpers::{report_json, test_config, test_runner, zip_archive, ScriptedProvider, TestPipeline};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app(reply: String) -> (Router, TestPipeline) {
    let provider = Arc::new(ScriptedProvider::always(reply));
    let pipeline = test_runner(&test_config(), provider).await;
    let state = AppState::new(pipeline.db.clone(), pipeline.runner.clone());
    (build_router(state), pipeline)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_project(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/projects", json!({"ownerId": "student-9", "name": "Lab 1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    body["projectId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_ok_and_limiter() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "cqa-ai");
    assert_eq!(body["rate_limit"]["requests_in_window"], 0);
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_analysis_kinds_listed() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;

    let (status, body) = send(&app, get("/analysis/kinds")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["code_quality", "complexity", "security", "best_practices", "learning_gaps"]
    );
}

#[tokio::test]
async fn test_full_flow_over_http() {
    let (app, _pipeline) = test_app(report_json(8.0, 3.0, 9.0)).await;
    let project_id = create_project(&app).await;

    let archive = zip_archive(&[("a.js", "let a;"), ("b.py", "b = 2"), ("readme.md", "docs")]);
    let upload = Request::builder()
        .method("POST")
        .uri(format!("/projects/{}/archive", project_id))
        .header("content-type", "application/zip")
        .body(Body::from(archive))
        .unwrap();
    let (status, body) = send(&app, upload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extractedCount"], 2);
    assert_eq!(body["status"], "EXTRACTED");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/projects/{}/batch", project_id),
            json!({"analysisTypes": ["security", "code_quality"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["batch"]["totalFiles"], 2);
    assert_eq!(body["batch"]["successfulAnalyses"], 2);
    assert_eq!(body["batch"]["results"][0]["qualityScore"], 8.0);
    assert!(body["batch"]["results"][0].get("analysis").is_none());
    assert_eq!(body["persistedAssessments"][0]["analysisType"], "code_quality");

    let (status, body) = send(&app, get(&format!("/projects/{}/assessments", project_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let assessment_id = body["assessments"][0]["analysisId"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/assessments/{}", assessment_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qualityScore"], 8.0);

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/assessments/{}", assessment_id),
            json!({"qualityScore": 9.5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qualityScore"], 9.5);

    let (status, body) = send(&app, get(&format!("/projects/{}/analytics", project_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalAnalyses"], 2);

    let (status, body) = send(&app, get("/users/student-9/progress?timeframe=7d")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["totalAnalyses"], 2);

    let (status, body) = send(&app, get("/users/student-9/projects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_patch_rejects_out_of_range_score() {
    let (app, _pipeline) = test_app(report_json(8.0, 3.0, 9.0)).await;
    let project_id = create_project(&app).await;

    let upload = Request::builder()
        .method("POST")
        .uri(format!("/projects/{}/archive", project_id))
        .body(Body::from(zip_archive(&[("a.js", "let a;")])))
        .unwrap();
    send(&app, upload).await;

    let (_, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/projects/{}/batch", project_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let assessment_id = body["persistedAssessments"][0]["analysisId"].as_str().unwrap().to_string();

    for bad in [0.0, 11.0] {
        let (status, body) = send(
            &app,
            json_request(
                "PATCH",
                &format!("/assessments/{}", assessment_id),
                json!({"qualityScore": bad}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/assessments/{}", assessment_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("No fields"));
}

#[tokio::test]
async fn test_missing_resources_return_404() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;
    let missing = uuid::Uuid::new_v4();

    for uri in [
        format!("/projects/{}", missing),
        format!("/projects/{}/analytics", missing),
        format!("/projects/{}/assessments", missing),
        format!("/assessments/{}", missing),
    ] {
        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_create_project_validation() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/projects", json!({"ownerId": "", "name": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_corrupt_upload_is_bad_request_and_recorded() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;
    let project_id = create_project(&app).await;

    let upload = Request::builder()
        .method("POST")
        .uri(format!("/projects/{}/archive", project_id))
        .body(Body::from("not a zip"))
        .unwrap();
    let (status, body) = send(&app, upload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, health) = send(&app, get("/health")).await;
    assert!(health["last_error"].as_str().unwrap().contains("Archive ingest"));
}

#[tokio::test]
async fn test_archived_project_conflicts_and_hard_delete() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;
    let project_id = create_project(&app).await;

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/projects/{}", project_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get(&format!("/projects/{}", project_id))).await;
    assert_eq!(body["status"], "ARCHIVED");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri(format!("/projects/{}/batch", project_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let hard_delete = Request::builder()
        .method("DELETE")
        .uri(format!("/projects/{}?hard=true", project_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, hard_delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&format!("/projects/{}", project_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_timeframe_rejected() {
    let (app, _pipeline) = test_app(report_json(5.0, 5.0, 5.0)).await;

    let (status, _) = send(&app, get("/users/u/progress?timeframe=2w")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
