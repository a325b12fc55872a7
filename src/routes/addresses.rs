use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressInput, AddressList},
    error::AppResult,
    middleware::auth::CurrentUser,
    models::Address,
    response::{ApiResponse, Empty},
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/{id}", delete(delete_address))
}

#[utoipa::path(
    get,
    path = "/api/addresses",
    responses(
        (status = 200, description = "Saved shipping addresses", body = ApiResponse<AddressList>)
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    Ok(Json(address_service::list_addresses(&state.pool, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = AddressInput,
    responses(
        (status = 201, description = "Address saved", body = ApiResponse<Address>),
        (status = 422, description = "Validation failed")
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AddressInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let resp = address_service::create_address(&state.pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Address not found"),
        (status = 409, description = "Address is used by an order")
    ),
    security(("session_cookie" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    Ok(Json(address_service::delete_address(&state.pool, &user, id).await?))
}
