mod common;

use axum::{
    Router,
    extract::Path,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use shopfront::{
    dto::auth::SessionUser,
    middleware::auth::{CurrentUser, OptionalUser, require_seller, set_session_user},
    models::Role,
    routes::create_api_router,
};
use tower::ServiceExt;
use tower_sessions::Session;
use uuid::Uuid;

use common::{get as get_req, json_body, lazy_state, memory_sessions, post_json, session_cookie};

async fn login_as(session: Session, Path(role): Path<Role>) -> StatusCode {
    let user = SessionUser {
        user_id: Uuid::new_v4(),
        role,
        first_name: "Test".into(),
    };
    match set_session_user(&session, &user).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn whoami(CurrentUser(user): CurrentUser) -> String {
    user.role.as_str().to_string()
}

async fn viewer(OptionalUser(user): OptionalUser) -> String {
    user.map_or_else(|| "guest".to_string(), |u| u.role.as_str().to_string())
}

fn app() -> Router {
    let state = lazy_state();
    let sessions = memory_sessions(&state);
    Router::new()
        .nest("/api", create_api_router())
        .route("/test/login/{role}", post(login_as))
        .route("/test/viewer", get(viewer))
        .route(
            "/test/seller-only",
            get(whoami).route_layer(from_fn(require_seller)),
        )
        .layer(sessions)
        .with_state(state)
}

async fn login(app: &Router, role: &str) -> String {
    let response = app
        .clone()
        .oneshot(common::request("POST", &format!("/test/login/{role}"), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    session_cookie(&response).expect("session cookie")
}

#[tokio::test]
async fn anonymous_requests_to_protected_routes_get_401() {
    let app = app();
    for uri in ["/api/cart", "/api/orders", "/api/seller/products", "/api/admin/users", "/api/auth/me"] {
        let response = app.clone().oneshot(get_req(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn wrong_role_gets_403() {
    let app = app();
    let seller = login(&app, "seller").await;
    let client = login(&app, "client").await;

    let response = app
        .clone()
        .oneshot(get_req("/api/cart", Some(&seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["data"]["error"], "Forbidden");

    let response = app
        .clone()
        .oneshot(get_req("/api/admin/logs", Some(&client)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get_req("/api/seller/orders", Some(&client)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn matching_role_reaches_the_handler_with_its_identity() {
    let app = app();
    let seller = login(&app, "seller").await;

    let response = app
        .clone()
        .oneshot(get_req("/test/seller-only", Some(&seller)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"seller");

    let admin = login(&app, "admin").await;
    let response = app
        .clone()
        .oneshot(get_req("/test/seller-only", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_routes_see_the_optional_user() {
    let app = app();
    let response = app.clone().oneshot(get_req("/test/viewer", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"guest");

    let client = login(&app, "client").await;
    let response = app
        .clone()
        .oneshot(get_req("/test/viewer", Some(&client)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"client");
}

#[tokio::test]
async fn signed_in_users_cannot_use_guest_routes() {
    let app = app();
    let client = login(&app, "client").await;

    let login_body = serde_json::json!({ "email": "a@example.com", "password": "password1" });
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/login", Some(&client), login_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let register_body = serde_json::json!({
        "first_name": "A",
        "last_name": "B",
        "email": "a@example.com",
        "password": "password1"
    });
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", Some(&client), register_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_registration_is_rejected_before_touching_the_database() {
    let app = app();
    let body = serde_json::json!({
        "first_name": "",
        "last_name": "B",
        "email": "not-an-email",
        "password": "short"
    });
    let response = app
        .oneshot(post_json("/api/auth/register", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["data"]["fields"]["email"].is_array());
    assert!(body["data"]["fields"]["password"].is_array());
}
