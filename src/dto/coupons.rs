use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::nullable,
    error::{AppError, AppResult, ValidationErrors},
    models::{Coupon, CouponType},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    pub min_cart_value: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateCouponRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        check_code(&mut errors, &self.code);
        check_value(&mut errors, self.discount_type, self.value);
        if let Some(min) = self.min_cart_value {
            errors.check(min >= 0, "min_cart_value", "must not be negative");
        }
        errors.into_result()
    }

    /// Codes are stored upper-cased so lookups are case-insensitive.
    pub fn normalized_code(&self) -> String {
        normalize_code(&self.code)
    }
}

/// Omitted fields are left alone; `null` clears `min_cart_value` or `expires_at`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub discount_type: Option<CouponType>,
    pub value: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub min_cart_value: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub active: Option<bool>,
}

impl UpdateCouponRequest {
    pub fn validate(&self, current: &Coupon) -> AppResult<()> {
        if self.discount_type.is_none()
            && self.value.is_none()
            && self.min_cart_value.is_none()
            && self.expires_at.is_none()
            && self.active.is_none()
        {
            return Err(AppError::BadRequest("nothing to update".into()));
        }
        let mut errors = ValidationErrors::new();
        let discount_type = self.discount_type.unwrap_or(current.discount_type);
        let value = self.value.unwrap_or(current.value);
        check_value(&mut errors, discount_type, value);
        if let Some(Some(min)) = self.min_cart_value {
            errors.check(min >= 0, "min_cart_value", "must not be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<Coupon>,
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn check_code(errors: &mut ValidationErrors, code: &str) {
    let code = normalize_code(code);
    let len = code.chars().count();
    errors.check(
        (3..=32).contains(&len)
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        "code",
        "must be 3 to 32 letters, digits, '_' or '-'",
    );
}

fn check_value(errors: &mut ValidationErrors, discount_type: CouponType, value: i64) {
    errors.check(value > 0, "value", "must be greater than 0");
    if discount_type == CouponType::Percentage {
        errors.check(value <= 100, "value", "percentage must be at most 100");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(code: &str, discount_type: CouponType, value: i64) -> CreateCouponRequest {
        CreateCouponRequest {
            code: code.into(),
            discount_type,
            value,
            min_cart_value: None,
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn code_shape() {
        assert!(create("spring-10", CouponType::Percentage, 10).validate().is_ok());
        assert!(create("ab", CouponType::Fixed, 10).validate().is_err());
        assert!(create("NO SPACES", CouponType::Fixed, 10).validate().is_err());
        assert_eq!(create(" spring-10 ", CouponType::Fixed, 1).normalized_code(), "SPRING-10");
    }

    #[test]
    fn percentage_cannot_exceed_hundred() {
        assert!(create("HALF", CouponType::Percentage, 101).validate().is_err());
        assert!(create("BIG", CouponType::Fixed, 10_000).validate().is_ok());
    }

    #[test]
    fn update_rechecks_value_against_resulting_type() {
        let current = Coupon {
            id: uuid::Uuid::new_v4(),
            code: "BIG".into(),
            discount_type: CouponType::Fixed,
            value: 5000,
            min_cart_value: None,
            expires_at: None,
            active: true,
            created_at: Utc::now(),
        };
        let switch_to_percent = UpdateCouponRequest {
            discount_type: Some(CouponType::Percentage),
            ..Default::default()
        };
        assert!(switch_to_percent.validate(&current).is_err());
    }

    #[test]
    fn update_tells_null_apart_from_missing() {
        let cleared: UpdateCouponRequest =
            serde_json::from_str(r#"{"min_cart_value":null,"expires_at":null}"#).unwrap();
        assert_eq!(cleared.min_cart_value, Some(None));
        assert_eq!(cleared.expires_at, Some(None));

        let untouched: UpdateCouponRequest = serde_json::from_str(r#"{"active":false}"#).unwrap();
        assert_eq!(untouched.min_cart_value, None);
        assert_eq!(untouched.expires_at, None);

        let set: UpdateCouponRequest = serde_json::from_str(r#"{"min_cart_value":2000}"#).unwrap();
        assert_eq!(set.min_cart_value, Some(Some(2000)));
    }
}
