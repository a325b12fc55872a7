use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::Product,
    routes::params::{ProductSortBy, SortOrder},
};

#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub seller_id: Option<Uuid>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

pub struct NewProduct<'a> {
    pub seller_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<&'a str>,
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, new: NewProduct<'_>) -> sqlx::Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, seller_id, name, description, category, price, stock, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.seller_id)
    .bind(new.name.trim())
    .bind(new.description)
    .bind(new.category.trim())
    .bind(new.price)
    .bind(new.stock)
    .bind(new.image_url)
    .fetch_one(db)
    .await
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Row-locks the product until the surrounding transaction ends.
pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE TRUE");
    if let Some(q) = filter.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", q);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category.as_ref().filter(|s| !s.is_empty()) {
        builder
            .push(" AND LOWER(category) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(seller_id) = filter.seller_id {
        builder.push(" AND seller_id = ").push_bind(seller_id);
    }
}

pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    filter: &ProductFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Product>> {
    let sort_by = filter.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = filter.sort_order.unwrap_or(SortOrder::Desc);

    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM products");
    push_filters(&mut builder, filter);
    builder
        .push(format!(
            " ORDER BY {} {}, id ",
            sort_by.as_sql(),
            sort_order.as_sql()
        ))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    builder.build_query_as::<Product>().fetch_all(db).await
}

pub async fn count<'e>(db: impl PgExecutor<'e>, filter: &ProductFilter) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_filters(&mut builder, filter);
    let (total,): (i64,) = builder.build_query_as().fetch_one(db).await?;
    Ok(total)
}

pub async fn categories<'e>(db: impl PgExecutor<'e>) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT category FROM products ORDER BY category")
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(c,)| c).collect())
}

pub async fn save<'e>(db: impl PgExecutor<'e>, product: &Product) -> sqlx::Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, category = $4, price = $5, stock = $6,
            image_url = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock)
    .bind(&product.image_url)
    .fetch_one(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Adds `delta` to stock unless the result would drop below zero.
/// Returns `None` when the product is missing or the adjustment was refused.
pub async fn adjust_stock<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    delta: i32,
) -> sqlx::Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET stock = stock + $2, updated_at = NOW()
        WHERE id = $1 AND stock + $2 >= 0
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(delta)
    .fetch_optional(db)
    .await
}

/// Conditional decrement; `false` means there was not enough stock.
pub async fn decrement_stock<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    quantity: i32,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn increment_stock<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    quantity: i32,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(quantity)
        .execute(db)
        .await?;
    Ok(())
}

/// Places a hold unless another client owns a live one.
pub async fn reserve<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    client_id: Uuid,
    quantity: i32,
    until: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = $3, reserved_by = $2, reserved_until = $4
        WHERE id = $1
          AND stock >= $3
          AND (reserved_by IS NULL OR reserved_by = $2 OR reserved_until IS NULL OR reserved_until <= NOW())
        "#,
    )
    .bind(id)
    .bind(client_id)
    .bind(quantity)
    .bind(until)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drops the hold on `id` if `client_id` owns it.
pub async fn release<'e>(db: impl PgExecutor<'e>, id: Uuid, client_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = 0, reserved_by = NULL, reserved_until = NULL
        WHERE id = $1 AND reserved_by = $2
        "#,
    )
    .bind(id)
    .bind(client_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn release_all_for<'e>(db: impl PgExecutor<'e>, client_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = 0, reserved_by = NULL, reserved_until = NULL
        WHERE reserved_by = $1
        "#,
    )
    .bind(client_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn release_expired<'e>(db: impl PgExecutor<'e>, now: DateTime<Utc>) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET reserved_quantity = 0, reserved_by = NULL, reserved_until = NULL
        WHERE reserved_until IS NOT NULL AND reserved_until <= $1
        "#,
    )
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_low_stock<'e>(
    db: impl PgExecutor<'e>,
    threshold: i32,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT * FROM products
        WHERE stock <= $1
        ORDER BY stock ASC, created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(threshold)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_low_stock<'e>(db: impl PgExecutor<'e>, threshold: i32) -> sqlx::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock <= $1")
        .bind(threshold)
        .fetch_one(db)
        .await?;
    Ok(total)
}
