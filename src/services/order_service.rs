use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        auth::SessionUser,
        orders::{OrderCreateDto, OrderLine, OrderList, OrderWithItems},
    },
    error::{AppError, AppResult},
    models::{LogType, Order, OrderStatus},
    repositories::{
        address_repository,
        order_repository::{self, NewOrder, NewOrderItem, OrderFilter},
        product_repository,
    },
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{coupon_service, log_service, product_service},
};

/// Folds repeated products into one line and orders lines by product id, so
/// concurrent checkouts lock product rows in the same order.
fn merged_lines(lines: &[OrderLine]) -> Vec<OrderLine> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(*line),
        }
    }
    merged.sort_by_key(|l| l.product_id);
    merged
}

/// Validates stock, takes it off the shelf, applies the coupon and persists
/// the order on `conn`. Commit or rollback is up to the caller.
pub async fn place_order(
    conn: &mut PgConnection,
    dto: &OrderCreateDto,
    now: DateTime<Utc>,
) -> AppResult<OrderWithItems> {
    dto.validate()?;

    let mut subtotal: i64 = 0;
    let mut lines = Vec::with_capacity(dto.lines.len());
    for line in merged_lines(&dto.lines) {
        let product = product_repository::find_for_update(&mut *conn, line.product_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Product {} is no longer available", line.product_id))
            })?;

        let available = product.available_for(Some(dto.client_id), now);
        if available < line.quantity {
            return Err(AppError::InsufficientStock {
                product_id: product.id,
                available,
            });
        }

        product_service::decrement_stock(&mut *conn, &product, line.quantity).await?;
        product_service::release(&mut *conn, product.id, dto.client_id).await?;

        subtotal = product
            .price
            .checked_mul(i64::from(line.quantity))
            .and_then(|line_total| subtotal.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
        lines.push(NewOrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
        });
    }

    let (coupon_code, discount) = match &dto.coupon_code {
        Some(code) => {
            let applied = coupon_service::resolve(&mut *conn, code, subtotal, now).await?;
            (Some(applied.coupon.code), applied.discount)
        }
        None => (None, 0),
    };
    let total = (subtotal - discount).max(0);

    let (order, items, address) = order_repository::save(
        conn,
        NewOrder {
            client_id: dto.client_id,
            address: &dto.address,
            payment_method: dto.payment_method,
            coupon_code: coupon_code.as_deref(),
            subtotal,
            discount,
            total,
        },
        &lines,
    )
    .await?;

    Ok(OrderWithItems {
        order,
        items,
        address: Some(address),
    })
}

/// Places an order in its own transaction.
pub async fn create_order(pool: &DbPool, dto: &OrderCreateDto) -> AppResult<OrderWithItems> {
    let mut tx = pool.begin().await?;
    let placed = place_order(&mut tx, dto, Utc::now()).await?;
    tx.commit().await?;

    log_service::record(
        pool,
        LogType::Order,
        "order_create",
        Some(dto.client_id),
        Some(serde_json::json!({ "order_id": placed.order.id, "total": placed.order.total })),
    )
    .await;
    Ok(placed)
}

async fn with_items(pool: &DbPool, order: Order) -> AppResult<OrderWithItems> {
    let items = order_repository::items(pool, order.id).await?;
    let address = address_repository::find_by_id(pool, order.address_id).await?;
    Ok(OrderWithItems {
        order,
        items,
        address,
    })
}

async fn list_with(
    pool: &DbPool,
    filter: OrderFilter,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let items = order_repository::list(pool, &filter, limit, offset).await?;
    let total = order_repository::count(pool, &filter).await?;
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_orders(
    pool: &DbPool,
    client: &SessionUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let filter = OrderFilter {
        client_id: Some(client.user_id),
        status: query.status,
        sort_order: query.sort_order,
        ..Default::default()
    };
    list_with(pool, filter, &query).await
}

pub async fn list_seller_orders(
    pool: &DbPool,
    seller: &SessionUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let filter = OrderFilter {
        seller_id: Some(seller.user_id),
        status: query.status,
        sort_order: query.sort_order,
        ..Default::default()
    };
    list_with(pool, filter, &query).await
}

pub async fn list_all_orders(pool: &DbPool, query: OrderListQuery) -> AppResult<ApiResponse<OrderList>> {
    let filter = OrderFilter {
        status: query.status,
        sort_order: query.sort_order,
        ..Default::default()
    };
    list_with(pool, filter, &query).await
}

pub async fn get_order(
    pool: &DbPool,
    client: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = order_repository::find_by_id(pool, id)
        .await?
        .filter(|o| o.client_id == client.user_id)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Order", with_items(pool, order).await?, Some(Meta::empty())))
}

pub async fn get_order_admin(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = order_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Order found",
        with_items(pool, order).await?,
        Some(Meta::empty()),
    ))
}

async fn restock(conn: &mut PgConnection, order_id: Uuid) -> AppResult<()> {
    for item in order_repository::items(&mut *conn, order_id).await? {
        if let Some(product_id) = item.product_id {
            product_repository::increment_stock(&mut *conn, product_id, item.quantity).await?;
        }
    }
    Ok(())
}

/// Moves the order to `next` under a row lock, restocking when the order is
/// cancelled or refunded. `owner` restricts the change to that client's orders.
async fn transition(
    pool: &DbPool,
    id: Uuid,
    next: OrderStatus,
    owner: Option<Uuid>,
) -> AppResult<Order> {
    let mut tx = pool.begin().await?;
    let order = order_repository::find_for_update(&mut tx, id)
        .await?
        .filter(|o| owner.is_none_or(|client| o.client_id == client))
        .ok_or(AppError::NotFound)?;

    if owner.is_some() && !order.status.client_cancellable() {
        return Err(AppError::BadRequest(
            "Order can no longer be cancelled".into(),
        ));
    }
    if !order.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {:?} to {:?}",
            order.status, next
        )));
    }
    if next.restocks() {
        restock(&mut tx, order.id).await?;
    }
    let order = order_repository::update_status(&mut *tx, order.id, next).await?;
    tx.commit().await?;
    Ok(order)
}

pub async fn cancel_order(
    pool: &DbPool,
    client: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = transition(pool, id, OrderStatus::Cancelled, Some(client.user_id)).await?;
    log_service::record(
        pool,
        LogType::Order,
        "order_cancel",
        Some(client.user_id),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await;
    Ok(ApiResponse::success("Order cancelled", order, Some(Meta::empty())))
}

pub async fn update_order_status(
    pool: &DbPool,
    admin: &SessionUser,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<ApiResponse<Order>> {
    let order = match transition(pool, id, status, None).await {
        Ok(order) => order,
        Err(err) => {
            log_service::record_failure(pool, "order_status_update", Some(admin.user_id), &err).await;
            return Err(err);
        }
    };

    log_service::record(
        pool,
        LogType::Order,
        "order_status_update",
        Some(admin.user_id),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await;
    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_lines_fold_duplicates_and_sort() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let lines = [
            OrderLine { product_id: a, quantity: 1 },
            OrderLine { product_id: b, quantity: 2 },
            OrderLine { product_id: a, quantity: 3 },
        ];
        let merged = merged_lines(&lines);
        assert_eq!(
            merged,
            vec![
                OrderLine { product_id: b, quantity: 2 },
                OrderLine { product_id: a, quantity: 4 },
            ]
        );
    }
}
