use axum::{Router, middleware::from_fn};

use crate::{
    middleware::auth::{require_admin, require_client, require_seller},
    state::AppState,
};

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod seller;

/// Every `/api` route with its role gate; state and session layer are
/// provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router().route_layer(from_fn(require_client)))
        .nest(
            "/addresses",
            addresses::router().route_layer(from_fn(require_client)),
        )
        .nest("/orders", orders::router().route_layer(from_fn(require_client)))
        .nest("/seller", seller::router().route_layer(from_fn(require_seller)))
        .nest("/admin", admin::router().route_layer(from_fn(require_admin)))
}
