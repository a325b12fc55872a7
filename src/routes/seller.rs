//! Seller back office: a seller's own catalogue and the orders that include it.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::OrderList,
        products::{CreateProductRequest, ProductList, StockAdjustRequest, UpdateProductRequest},
    },
    error::AppResult,
    middleware::auth::CurrentUser,
    models::Product,
    response::{ApiResponse, Empty},
    routes::params::{OrderListQuery, ProductQuery},
    services::{order_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", patch(adjust_stock))
        .route("/orders", get(list_orders))
}

#[utoipa::path(
    get,
    path = "/api/seller/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Products owned by the seller", body = ApiResponse<ProductList>)
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(
        product_service::list_seller_products(&state.pool, &user, query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/seller/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 422, description = "Validation failed")
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state.pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/seller/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Own product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(
        product_service::get_seller_product(&state.pool, &user, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/seller/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(
        product_service::update_product(&state.pool, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/seller/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Product not found")
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    Ok(Json(
        product_service::delete_product(&state.pool, &user, id).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/seller/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StockAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Product>),
        (status = 400, description = "Stock would become negative"),
        (status = 404, description = "Product not found")
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(
        product_service::adjust_stock(&state.pool, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders containing the seller's products", body = ApiResponse<OrderList>)
    ),
    security(("session_cookie" = [])),
    tag = "Seller"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(
        order_service::list_seller_orders(&state.pool, &user, query).await?,
    ))
}
