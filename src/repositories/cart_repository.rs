use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::{Cart, CartItem, Product};

/// A client has exactly one cart; it is created on first use.
pub async fn find_or_create<'e>(db: impl PgExecutor<'e>, client_id: Uuid) -> sqlx::Result<Cart> {
    sqlx::query_as::<_, Cart>(
        r#"
        INSERT INTO carts (id, client_id)
        VALUES ($1, $2)
        ON CONFLICT (client_id) DO UPDATE SET client_id = EXCLUDED.client_id
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .fetch_one(db)
    .await
}

pub async fn items<'e>(db: impl PgExecutor<'e>, cart_id: Uuid) -> sqlx::Result<Vec<CartItem>> {
    sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id",
    )
    .bind(cart_id)
    .fetch_all(db)
    .await
}

/// Locks the cart lines so a concurrent checkout of the same cart waits.
pub async fn items_for_update(conn: &mut PgConnection, cart_id: Uuid) -> sqlx::Result<Vec<CartItem>> {
    sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id FOR UPDATE",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await
}

pub async fn find_item<'e>(
    db: impl PgExecutor<'e>,
    cart_id: Uuid,
    product_id: Uuid,
) -> sqlx::Result<Option<CartItem>> {
    sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(db)
    .await
}

/// Writes the line with `quantity`, snapshotting the product's current name and price.
pub async fn set_line<'e>(
    db: impl PgExecutor<'e>,
    cart_id: Uuid,
    product: &Product,
    quantity: i32,
) -> sqlx::Result<CartItem> {
    sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, product_name, unit_price, quantity)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (cart_id, product_id) DO UPDATE
        SET quantity = EXCLUDED.quantity,
            product_name = EXCLUDED.product_name,
            unit_price = EXCLUDED.unit_price
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product.id)
    .bind(&product.name)
    .bind(product.price)
    .bind(quantity)
    .fetch_one(db)
    .await
}

pub async fn remove_item<'e>(
    db: impl PgExecutor<'e>,
    cart_id: Uuid,
    product_id: Uuid,
) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear<'e>(db: impl PgExecutor<'e>, cart_id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch<'e>(db: impl PgExecutor<'e>, cart_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(db)
        .await?;
    Ok(())
}
