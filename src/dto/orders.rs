use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::addresses::AddressInput,
    error::{AppError, AppResult, ValidationErrors},
    models::{Address, CartItem, Order, OrderItem, OrderStatus, PaymentMethod},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// A saved address of the client; takes precedence over `address`.
    pub address_id: Option<Uuid>,
    pub address: Option<AddressInput>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        match (&self.address_id, &self.address) {
            (Some(_), _) => {}
            (None, Some(address)) => address.collect_errors(&mut errors),
            (None, None) => errors.add("address", "an address or address_id is required"),
        }
        if let Some(code) = &self.coupon_code {
            errors.check(!code.trim().is_empty(), "coupon_code", "must not be blank");
        }
        errors.into_result()
    }

    pub fn address_selection(&self) -> AppResult<AddressSelection> {
        match (self.address_id, &self.address) {
            (Some(id), _) => Ok(AddressSelection::Saved(id)),
            (None, Some(input)) => Ok(AddressSelection::New(input.clone())),
            (None, None) => Err(AppError::BadRequest("address is required".into())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AddressSelection {
    Saved(Uuid),
    New(AddressInput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Everything needed to place an order, assembled from a client's cart.
#[derive(Debug, Clone)]
pub struct OrderCreateDto {
    pub client_id: Uuid,
    pub address: AddressSelection,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub lines: Vec<OrderLine>,
}

impl OrderCreateDto {
    pub fn from_cart(
        client_id: Uuid,
        request: &CheckoutRequest,
        items: &[CartItem],
    ) -> AppResult<Self> {
        let dto = Self {
            client_id,
            address: request.address_selection()?,
            payment_method: request.payment_method,
            coupon_code: request
                .coupon_code
                .as_ref()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            lines: items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        };
        dto.validate()?;
        Ok(dto)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.lines.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".into()));
        }
        let mut errors = ValidationErrors::new();
        errors.check(
            self.lines.iter().all(|l| l.quantity > 0),
            "quantity",
            "every line needs a positive quantity",
        );
        if let AddressSelection::New(address) = &self.address {
            address.collect_errors(&mut errors);
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: Option<Address>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
