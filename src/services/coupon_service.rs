use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        auth::SessionUser,
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest, normalize_code},
    },
    error::{AppError, AppResult},
    models::{Coupon, LogType},
    repositories::coupon_repository,
    response::{ApiResponse, Empty, Meta},
    routes::params::Pagination,
    services::{auth_service::is_unique_violation, log_service},
};

#[derive(Debug, Clone)]
pub struct AppliedCoupon {
    pub coupon: Coupon,
    pub discount: i64,
}

/// Looks up `code` and checks it against `subtotal`.
pub async fn resolve<'e>(
    db: impl PgExecutor<'e>,
    code: &str,
    subtotal: i64,
    now: DateTime<Utc>,
) -> AppResult<AppliedCoupon> {
    let coupon = coupon_repository::find_by_code(db, &normalize_code(code))
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown coupon code".into()))?;
    coupon
        .check_usable(now, subtotal)
        .map_err(|why| AppError::BadRequest(format!("Coupon cannot be used: {why}")))?;
    let discount = coupon.discount_for(subtotal);
    Ok(AppliedCoupon { coupon, discount })
}

pub async fn list_coupons(pool: &DbPool, pagination: Pagination) -> AppResult<ApiResponse<CouponList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = coupon_repository::list(pool, limit, offset).await?;
    let total = coupon_repository::count(pool).await?;
    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_coupon(
    pool: &DbPool,
    admin: &SessionUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    payload.validate()?;
    let coupon = coupon_repository::insert(pool, &payload)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict("Coupon code already exists".into())
            } else {
                AppError::DbError(err)
            }
        })?;

    log_service::record(
        pool,
        LogType::Coupon,
        "coupon_create",
        Some(admin.user_id),
        Some(serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code })),
    )
    .await;
    Ok(ApiResponse::success("Coupon created", coupon, Some(Meta::empty())))
}

pub async fn update_coupon(
    pool: &DbPool,
    admin: &SessionUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    let mut coupon = coupon_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    payload.validate(&coupon)?;

    if let Some(discount_type) = payload.discount_type {
        coupon.discount_type = discount_type;
    }
    if let Some(value) = payload.value {
        coupon.value = value;
    }
    if let Some(min) = payload.min_cart_value {
        coupon.min_cart_value = min;
    }
    if let Some(expires_at) = payload.expires_at {
        coupon.expires_at = expires_at;
    }
    if let Some(active) = payload.active {
        coupon.active = active;
    }
    let coupon = coupon_repository::save(pool, &coupon).await?;

    log_service::record(
        pool,
        LogType::Coupon,
        "coupon_update",
        Some(admin.user_id),
        Some(serde_json::json!({ "coupon_id": coupon.id, "active": coupon.active })),
    )
    .await;
    Ok(ApiResponse::success("Coupon updated", coupon, Some(Meta::empty())))
}

pub async fn delete_coupon(
    pool: &DbPool,
    admin: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    if !coupon_repository::delete(pool, id).await? {
        return Err(AppError::NotFound);
    }
    log_service::record(
        pool,
        LogType::Coupon,
        "coupon_delete",
        Some(admin.user_id),
        Some(serde_json::json!({ "coupon_id": id })),
    )
    .await;
    Ok(ApiResponse::success("Coupon deleted", Empty::default(), Some(Meta::empty())))
}
