use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::{
        auth::SessionUser,
        cart::{
            AddToCartRequest, ApplyCouponRequest, CartView, CouponPreview, MAX_LINE_QUANTITY,
            UpdateCartItemRequest,
        },
        orders::{CheckoutRequest, OrderCreateDto, OrderWithItems},
    },
    error::{AppError, AppResult},
    models::LogType,
    repositories::{cart_repository, product_repository},
    response::{ApiResponse, Empty, Meta},
    services::{coupon_service, log_service, order_service, product_service},
    state::AppState,
};

async fn load_view(state: &AppState, client_id: Uuid) -> AppResult<CartView> {
    let cart = cart_repository::find_or_create(&state.pool, client_id).await?;
    let items = cart_repository::items(&state.pool, cart.id).await?;
    CartView::new(cart.id, items)
}

pub async fn view_cart(state: &AppState, client: &SessionUser) -> AppResult<ApiResponse<CartView>> {
    let view = load_view(state, client.user_id).await?;
    Ok(ApiResponse::success("Cart", view, Some(Meta::empty())))
}

enum LineChange {
    /// Adds to whatever the line already holds, creating it if needed.
    Add(i32),
    /// Replaces the quantity of an existing line.
    Set(i32),
}

/// Applies `change` to the line for `product_id`, checking availability and
/// holding the last units for this client. The stored quantity is read while
/// the cart and product rows are locked.
async fn put_line(
    state: &AppState,
    client: &SessionUser,
    product_id: Uuid,
    change: LineChange,
) -> AppResult<()> {
    let now = Utc::now();
    let mut tx = state.pool.begin().await?;
    let cart = cart_repository::find_or_create(&mut *tx, client.user_id).await?;
    let product = product_repository::find_for_update(&mut tx, product_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    let existing = cart_repository::find_item(&mut *tx, cart.id, product_id)
        .await?
        .map(|item| item.quantity);

    let quantity = match change {
        LineChange::Add(extra) => {
            let quantity = existing.unwrap_or(0) + extra;
            if quantity > MAX_LINE_QUANTITY {
                return Err(AppError::BadRequest("quantity per product is limited to 99".into()));
            }
            quantity
        }
        LineChange::Set(quantity) => {
            if existing.is_none() {
                return Err(AppError::NotFound);
            }
            quantity
        }
    };

    let available = product.available_for(Some(client.user_id), now);
    if quantity > available {
        return Err(AppError::InsufficientStock {
            product_id,
            available,
        });
    }

    cart_repository::set_line(&mut *tx, cart.id, &product, quantity).await?;
    if quantity == product.stock {
        let until = now
            + chrono::Duration::from_std(state.config.reservation_ttl)
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        if product_service::reserve(&mut *tx, product.id, client.user_id, quantity, until).await? {
            tracing::debug!(product_id = %product.id, client_id = %client.user_id, "last units reserved");
        }
    } else {
        product_service::release(&mut *tx, product.id, client.user_id).await?;
    }
    cart_repository::touch(&mut *tx, cart.id).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn add_item(
    state: &AppState,
    client: &SessionUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    payload.validate()?;
    put_line(state, client, payload.product_id, LineChange::Add(payload.quantity)).await?;

    log_service::record(
        &state.pool,
        LogType::Cart,
        "cart_add",
        Some(client.user_id),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await;
    let view = load_view(state, client.user_id).await?;
    Ok(ApiResponse::success("Added to cart", view, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    client: &SessionUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    payload.validate()?;
    if payload.quantity == 0 {
        return remove_item(state, client, product_id).await;
    }
    put_line(state, client, product_id, LineChange::Set(payload.quantity)).await?;

    log_service::record(
        &state.pool,
        LogType::Cart,
        "cart_update",
        Some(client.user_id),
        Some(serde_json::json!({ "product_id": product_id, "quantity": payload.quantity })),
    )
    .await;
    let view = load_view(state, client.user_id).await?;
    Ok(ApiResponse::success("Cart updated", view, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    client: &SessionUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let mut tx = state.pool.begin().await?;
    let cart = cart_repository::find_or_create(&mut *tx, client.user_id).await?;
    if !cart_repository::remove_item(&mut *tx, cart.id, product_id).await? {
        return Err(AppError::NotFound);
    }
    product_service::release(&mut *tx, product_id, client.user_id).await?;
    cart_repository::touch(&mut *tx, cart.id).await?;
    tx.commit().await?;

    log_service::record(
        &state.pool,
        LogType::Cart,
        "cart_remove",
        Some(client.user_id),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;
    let view = load_view(state, client.user_id).await?;
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, client: &SessionUser) -> AppResult<ApiResponse<Empty>> {
    let mut tx = state.pool.begin().await?;
    let cart = cart_repository::find_or_create(&mut *tx, client.user_id).await?;
    let removed = cart_repository::clear(&mut *tx, cart.id).await?;
    product_repository::release_all_for(&mut *tx, client.user_id).await?;
    tx.commit().await?;

    log_service::record(
        &state.pool,
        LogType::Cart,
        "cart_clear",
        Some(client.user_id),
        Some(serde_json::json!({ "lines": removed })),
    )
    .await;
    Ok(ApiResponse::success("Cart cleared", Empty::default(), Some(Meta::empty())))
}

pub async fn preview_coupon(
    state: &AppState,
    client: &SessionUser,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponPreview>> {
    let view = load_view(state, client.user_id).await?;
    if view.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    let applied =
        coupon_service::resolve(&state.pool, &payload.code, view.subtotal, Utc::now()).await?;
    let preview = CouponPreview {
        code: applied.coupon.code,
        subtotal: view.subtotal,
        discount: applied.discount,
        total: (view.subtotal - applied.discount).max(0),
    };
    Ok(ApiResponse::success("Coupon applied", preview, Some(Meta::empty())))
}

/// Turns the cart into an order. Placing the order and emptying the cart share
/// one transaction, so the cart survives any failure.
pub async fn checkout(
    state: &AppState,
    client: &SessionUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let result = checkout_inner(state, client, payload).await;
    match &result {
        Ok(placed) => {
            log_service::record(
                &state.pool,
                LogType::Order,
                "checkout",
                Some(client.user_id),
                Some(serde_json::json!({
                    "order_id": placed.order.id,
                    "total": placed.order.total,
                    "coupon": placed.order.coupon_code,
                })),
            )
            .await;
        }
        Err(err) => {
            log_service::record_failure(&state.pool, "checkout", Some(client.user_id), err).await;
        }
    }
    Ok(ApiResponse::success("Checkout success", result?, Some(Meta::empty())))
}

async fn checkout_inner(
    state: &AppState,
    client: &SessionUser,
    payload: CheckoutRequest,
) -> AppResult<OrderWithItems> {
    payload.validate()?;
    let mut tx = state.pool.begin().await?;
    let cart = cart_repository::find_or_create(&mut *tx, client.user_id).await?;
    let items = cart_repository::items_for_update(&mut tx, cart.id).await?;
    let dto = OrderCreateDto::from_cart(client.user_id, &payload, &items)?;

    let placed = order_service::place_order(&mut tx, &dto, Utc::now()).await?;
    cart_repository::clear(&mut *tx, cart.id).await?;
    tx.commit().await?;
    Ok(placed)
}
