use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{dto::addresses::AddressInput, models::Address};

pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    client_id: Uuid,
    input: &AddressInput,
) -> sqlx::Result<Address> {
    sqlx::query_as::<_, Address>(
        r#"
        INSERT INTO addresses (id, client_id, full_name, street, city, postal_code, country, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(input.full_name.trim())
    .bind(input.street.trim())
    .bind(input.city.trim())
    .bind(input.postal_code.trim())
    .bind(input.country.trim())
    .bind(input.phone.as_deref().map(str::trim))
    .fetch_one(db)
    .await
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Address>> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_for_client<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    client_id: Uuid,
) -> sqlx::Result<Option<Address>> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND client_id = $2")
        .bind(id)
        .bind(client_id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_client<'e>(
    db: impl PgExecutor<'e>,
    client_id: Uuid,
) -> sqlx::Result<Vec<Address>> {
    sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE client_id = $1 ORDER BY created_at DESC",
    )
    .bind(client_id)
    .fetch_all(db)
    .await
}

/// Addresses referenced by an order are kept.
pub async fn delete_unused<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    client_id: Uuid,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM addresses a
        WHERE a.id = $1 AND a.client_id = $2
          AND NOT EXISTS (SELECT 1 FROM orders o WHERE o.address_id = a.id)
        "#,
    )
    .bind(id)
    .bind(client_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
