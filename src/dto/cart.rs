use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ValidationErrors},
    models::CartItem,
};

pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl AddToCartRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(
            (1..=MAX_LINE_QUANTITY).contains(&self.quantity),
            "quantity",
            "must be between 1 and 99",
        );
        errors.into_result()
    }
}

/// Quantity 0 removes the line.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

impl UpdateCartItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(
            (0..=MAX_LINE_QUANTITY).contains(&self.quantity),
            "quantity",
            "must be between 0 and 99",
        );
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart_id: Uuid,
    pub items: Vec<CartItem>,
    pub item_count: i32,
    pub subtotal: i64,
}

impl CartView {
    pub fn new(cart_id: Uuid, items: Vec<CartItem>) -> AppResult<Self> {
        let item_count = items.iter().map(|i| i.quantity).sum();
        let subtotal = items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.line_total()?))
            .ok_or_else(|| AppError::BadRequest("Cart total is too large".into()))?;
        Ok(Self {
            cart_id,
            items,
            item_count,
            subtotal,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponPreview {
    pub code: String,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn quantity_bounds() {
        let add = |quantity| AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity,
        };
        assert!(add(0).validate().is_err());
        assert!(add(1).validate().is_ok());
        assert!(add(100).validate().is_err());
        assert!(UpdateCartItemRequest { quantity: 0 }.validate().is_ok());
        assert!(UpdateCartItemRequest { quantity: -1 }.validate().is_err());
    }

    #[test]
    fn cart_view_sums_lines() {
        let cart_id = Uuid::new_v4();
        let line = |unit_price, quantity| CartItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id: Uuid::new_v4(),
            product_name: "x".into(),
            unit_price,
            quantity,
            created_at: Utc::now(),
        };
        let view = CartView::new(cart_id, vec![line(250, 2), line(1000, 1)]).unwrap();
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, 1500);
    }

    #[test]
    fn cart_view_rejects_totals_that_overflow() {
        let cart_id = Uuid::new_v4();
        let line = |unit_price, quantity| CartItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id: Uuid::new_v4(),
            product_name: "x".into(),
            unit_price,
            quantity,
            created_at: Utc::now(),
        };
        let single = CartView::new(cart_id, vec![line(i64::MAX / 2, 3)]);
        assert!(matches!(single, Err(AppError::BadRequest(_))));

        let summed = CartView::new(cart_id, vec![line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(10, 1)]);
        assert!(matches!(summed, Err(AppError::BadRequest(_))));
    }
}
