use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::within,
    error::{AppError, AppResult, ValidationErrors},
    models::{MAX_PRICE, Product},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_category(&mut errors, &self.category);
        check_description(&mut errors, &self.description);
        check_price(&mut errors, self.price);
        errors.check(self.stock >= 0, "stock", "must not be negative");
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.image_url.is_none()
        {
            return Err(AppError::BadRequest("nothing to update".into()));
        }
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }
        if let Some(category) = &self.category {
            check_category(&mut errors, category);
        }
        if let Some(description) = &self.description {
            check_description(&mut errors, description);
        }
        if let Some(price) = self.price {
            check_price(&mut errors, price);
        }
        if let Some(stock) = self.stock {
            errors.check(stock >= 0, "stock", "must not be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockAdjustRequest {
    pub delta: i32,
}

impl StockAdjustRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.delta == 0 {
            return Err(AppError::BadRequest("delta must not be 0".into()));
        }
        Ok(())
    }
}

/// Storefront view of one product with what the caller can still take.
#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub available: i32,
    pub reserved: i32,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    errors.check(within(name, 1, 200), "name", "must be 1 to 200 characters");
}

fn check_category(errors: &mut ValidationErrors, category: &str) {
    errors.check(
        within(category, 1, 100),
        "category",
        "must be 1 to 100 characters",
    );
}

fn check_price(errors: &mut ValidationErrors, price: i64) {
    errors.check(
        (1..=MAX_PRICE).contains(&price),
        "price",
        "must be between 1 and 10000000000",
    );
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    errors.check(
        description.chars().count() <= 5000,
        "description",
        "must be at most 5000 characters",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_free_or_negative_stock() {
        let req = CreateProductRequest {
            name: "Lamp".into(),
            description: String::new(),
            category: "home".into(),
            price: 0,
            stock: -1,
            image_url: None,
        };
        let Err(AppError::Validation(errors)) = req.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.has("price"));
        assert!(errors.has("stock"));
        assert!(!errors.has("name"));
    }

    #[test]
    fn update_needs_a_field() {
        assert!(matches!(
            UpdateProductRequest::default().validate(),
            Err(AppError::BadRequest(_))
        ));
        let req = UpdateProductRequest {
            price: Some(450),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn price_has_an_upper_bound() {
        let req = CreateProductRequest {
            name: "Lamp".into(),
            description: String::new(),
            category: "home".into(),
            price: MAX_PRICE + 1,
            stock: 1,
            image_url: None,
        };
        assert!(req.validate().is_err());

        let update = |price| UpdateProductRequest {
            price: Some(price),
            ..Default::default()
        };
        assert!(update(i64::MAX / 2).validate().is_err());
        assert!(update(MAX_PRICE).validate().is_ok());
    }

    #[test]
    fn zero_stock_delta_is_rejected() {
        assert!(StockAdjustRequest { delta: 0 }.validate().is_err());
        assert!(StockAdjustRequest { delta: -3 }.validate().is_ok());
    }
}
