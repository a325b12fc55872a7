use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dto::orders::AddressSelection,
    error::{AppError, AppResult},
    models::{Address, Order, OrderItem, OrderStatus, PaymentMethod},
    repositories::address_repository,
    routes::params::SortOrder,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct OrderFilter {
    pub client_id: Option<Uuid>,
    /// Orders with at least one line for this seller's products.
    pub seller_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

pub struct NewOrder<'a> {
    pub client_id: Uuid,
    pub address: &'a AddressSelection,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<&'a str>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

/// Persists the delivery address (when new), the order and its lines on `conn`.
/// The caller owns the transaction.
pub async fn save(
    conn: &mut PgConnection,
    new: NewOrder<'_>,
    lines: &[NewOrderItem],
) -> AppResult<(Order, Vec<OrderItem>, Address)> {
    let address = match new.address {
        AddressSelection::Saved(id) => {
            address_repository::find_for_client(&mut *conn, *id, new.client_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("unknown address".into()))?
        }
        AddressSelection::New(input) => {
            address_repository::insert(&mut *conn, new.client_id, input).await?
        }
    };

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders
            (id, client_id, status, address_id, payment_method, coupon_code, subtotal, discount, total)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.client_id)
    .bind(OrderStatus::Pending)
    .bind(address.id)
    .bind(new.payment_method)
    .bind(new.coupon_code)
    .bind(new.subtotal)
    .bind(new.discount)
    .bind(new.total)
    .fetch_one(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (id, order_id, product_id, product_name, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.unit_price)
        .bind(line.quantity)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }

    Ok((order, items, address))
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn items<'e>(db: impl PgExecutor<'e>, order_id: Uuid) -> sqlx::Result<Vec<OrderItem>> {
    sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_name, id",
    )
    .bind(order_id)
    .fetch_all(db)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    builder.push(" WHERE TRUE");
    if let Some(client_id) = filter.client_id {
        builder.push(" AND o.client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status);
    }
    if let Some(seller_id) = filter.seller_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM order_items oi JOIN products p ON p.id = oi.product_id \
                 WHERE oi.order_id = o.id AND p.seller_id = ",
            )
            .push_bind(seller_id)
            .push(")");
    }
}

pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    filter: &OrderFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Order>> {
    let sort_order = filter.sort_order.unwrap_or(SortOrder::Desc);
    let mut builder = QueryBuilder::<Postgres>::new("SELECT o.* FROM orders o");
    push_filters(&mut builder, filter);
    builder
        .push(format!(" ORDER BY o.created_at {}, o.id", sort_order.as_sql()))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<Order>().fetch_all(db).await
}

pub async fn count<'e>(db: impl PgExecutor<'e>, filter: &OrderFilter) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
    push_filters(&mut builder, filter);
    let (total,): (i64,) = builder.build_query_as().fetch_one(db).await?;
    Ok(total)
}

pub async fn update_status<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    status: OrderStatus,
) -> sqlx::Result<Order> {
    sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await
}
