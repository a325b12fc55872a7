use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{dto::coupons::CreateCouponRequest, models::Coupon};

pub async fn insert<'e>(db: impl PgExecutor<'e>, req: &CreateCouponRequest) -> sqlx::Result<Coupon> {
    sqlx::query_as::<_, Coupon>(
        r#"
        INSERT INTO coupons (id, code, discount_type, value, min_cart_value, expires_at, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.normalized_code())
    .bind(req.discount_type)
    .bind(req.value)
    .bind(req.min_cart_value)
    .bind(req.expires_at)
    .bind(req.active)
    .fetch_one(db)
    .await
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<Coupon>> {
    sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// `code` must already be normalised.
pub async fn find_by_code<'e>(db: impl PgExecutor<'e>, code: &str) -> sqlx::Result<Option<Coupon>> {
    sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_optional(db)
        .await
}

pub async fn list<'e>(db: impl PgExecutor<'e>, limit: i64, offset: i64) -> sqlx::Result<Vec<Coupon>> {
    sqlx::query_as::<_, Coupon>(
        "SELECT * FROM coupons ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count<'e>(db: impl PgExecutor<'e>) -> sqlx::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM coupons")
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub async fn save<'e>(db: impl PgExecutor<'e>, coupon: &Coupon) -> sqlx::Result<Coupon> {
    sqlx::query_as::<_, Coupon>(
        r#"
        UPDATE coupons
        SET discount_type = $2, value = $3, min_cart_value = $4, expires_at = $5, active = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(coupon.id)
    .bind(coupon.discount_type)
    .bind(coupon.value)
    .bind(coupon.min_cart_value)
    .bind(coupon.expires_at)
    .bind(coupon.active)
    .fetch_one(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
