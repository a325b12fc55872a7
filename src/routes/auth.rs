use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, SessionUser},
    error::AppResult,
    middleware::auth::{CurrentUser, require_auth, require_guest},
    models::User,
    response::{ApiResponse, Empty, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let guest = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(from_fn(require_guest));
    let signed_in = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route_layer(from_fn(require_auth));
    guest.merge(signed_in)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = auth_service::register_user(&state.pool, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<SessionUser>),
        (status = 400, description = "Invalid credentials"),
        (status = 403, description = "Already signed in")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SessionUser>>> {
    let resp = auth_service::login_user(&state.pool, &session, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session ended", body = ApiResponse<Empty>),
        (status = 401, description = "Not signed in")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Empty>>> {
    auth_service::logout_user(&state.pool, &session, &user).await?;
    Ok(Json(ApiResponse::success(
        "Logged out",
        Empty::default(),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Signed-in user", body = ApiResponse<User>),
        (status = 401, description = "Not signed in")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(auth_service::current_user(&state.pool, &user).await?))
}
