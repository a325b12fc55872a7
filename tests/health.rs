mod common;

use axum::http::StatusCode;
use shopfront::app::build_app;
use tower::ServiceExt;

use common::{get, json_body, lazy_state, memory_sessions};

#[tokio::test]
async fn health_check_reports_database_down_without_failing() {
    let state = lazy_state();
    let app = build_app(state.clone(), memory_sessions(&state));

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "down");
}

#[tokio::test]
async fn unknown_path_falls_back_to_json_not_found() {
    let state = lazy_state();
    let app = build_app(state.clone(), memory_sessions(&state));

    let response = app.oneshot(get("/nowhere", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["data"]["path"], "/nowhere");
}
