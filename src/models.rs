use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
            Role::Client => "client",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }
}

/// Highest accepted unit price in minor units; the `products` CHECK matches it.
pub const MAX_PRICE: i64 = 10_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub stock: i32,
    pub reserved_quantity: i32,
    #[serde(skip_serializing)]
    pub reserved_by: Option<Uuid>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn reservation_active(&self, now: DateTime<Utc>) -> bool {
        self.reserved_quantity > 0 && self.reserved_until.is_some_and(|until| until > now)
    }

    /// Units `client` may still take: stock minus a live hold owned by someone else.
    pub fn available_for(&self, client: Option<Uuid>, now: DateTime<Utc>) -> i32 {
        let held_by_other = self.reservation_active(now) && self.reserved_by != client;
        let held = if held_by_other {
            self.reserved_quantity
        } else {
            0
        };
        (self.stock - held).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub client_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// `None` when the line does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Address {
    pub id: Uuid,
    pub client_id: Uuid,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
                | (Delivered, Completed)
                | (Delivered, Refunded)
                | (Completed, Refunded)
        )
    }

    /// Entering this status puts the ordered units back on the shelf.
    pub fn restocks(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    pub fn client_cancellable(self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    CashOnDelivery,
    Paypal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub status: OrderStatus,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "coupon_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    Inactive,
    Expired,
    BelowMinimum { minimum: i64 },
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponRejection::Inactive => write!(f, "coupon is not active"),
            CouponRejection::Expired => write!(f, "coupon has expired"),
            CouponRejection::BelowMinimum { minimum } => {
                write!(f, "cart total must be at least {minimum}")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: CouponType,
    pub value: i64,
    pub min_cart_value: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn check_usable(&self, now: DateTime<Utc>, subtotal: i64) -> Result<(), CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }
        if self.expires_at.is_some_and(|at| at <= now) {
            return Err(CouponRejection::Expired);
        }
        if let Some(minimum) = self.min_cart_value {
            if subtotal < minimum {
                return Err(CouponRejection::BelowMinimum { minimum });
            }
        }
        Ok(())
    }

    /// Discount in minor units, never more than `subtotal`.
    pub fn discount_for(&self, subtotal: i64) -> i64 {
        let subtotal = subtotal.max(0);
        let raw = match self.discount_type {
            CouponType::Percentage => {
                let percent = i128::from(self.value.clamp(0, 100));
                i64::try_from(i128::from(subtotal) * percent / 100).unwrap_or(subtotal)
            }
            CouponType::Fixed => self.value,
        };
        raw.clamp(0, subtotal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "log_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Auth,
    User,
    Product,
    Cart,
    Order,
    Coupon,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Log {
    pub id: Uuid,
    pub log_type: LogType,
    pub action: String,
    pub user_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            name: "Mug".into(),
            description: String::new(),
            category: "kitchen".into(),
            price: 1200,
            image_url: None,
            stock,
            reserved_quantity: 0,
            reserved_by: None,
            reserved_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn coupon(discount_type: CouponType, value: i64) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE".into(),
            discount_type,
            value,
            min_cart_value: None,
            expires_at: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reservation_hides_units_from_other_clients_only() {
        let now = Utc::now();
        let holder = Uuid::new_v4();
        let mut p = product(3);
        p.reserved_quantity = 1;
        p.reserved_by = Some(holder);
        p.reserved_until = Some(now + Duration::seconds(60));

        assert_eq!(p.available_for(Some(holder), now), 3);
        assert_eq!(p.available_for(Some(Uuid::new_v4()), now), 2);
        assert_eq!(p.available_for(None, now), 2);
    }

    #[test]
    fn expired_reservation_is_ignored() {
        let now = Utc::now();
        let mut p = product(1);
        p.reserved_quantity = 1;
        p.reserved_by = Some(Uuid::new_v4());
        p.reserved_until = Some(now - Duration::seconds(1));

        assert!(!p.reservation_active(now));
        assert_eq!(p.available_for(Some(Uuid::new_v4()), now), 1);
    }

    #[test]
    fn availability_never_negative() {
        let now = Utc::now();
        let mut p = product(1);
        p.reserved_quantity = 4;
        p.reserved_by = Some(Uuid::new_v4());
        p.reserved_until = Some(now + Duration::seconds(60));
        assert_eq!(p.available_for(None, now), 0);
    }

    #[test]
    fn status_transitions_follow_fulfilment_order() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn only_early_orders_are_client_cancellable() {
        assert!(OrderStatus::Pending.client_cancellable());
        assert!(OrderStatus::Processing.client_cancellable());
        assert!(!OrderStatus::Shipped.client_cancellable());
        assert!(OrderStatus::Cancelled.restocks());
        assert!(OrderStatus::Refunded.restocks());
        assert!(!OrderStatus::Completed.restocks());
    }

    #[test]
    fn percentage_discount_rounds_down() {
        let c = coupon(CouponType::Percentage, 15);
        assert_eq!(c.discount_for(999), 149);
        assert_eq!(c.discount_for(0), 0);
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let c = coupon(CouponType::Fixed, 5000);
        assert_eq!(c.discount_for(1200), 1200);
        assert_eq!(c.discount_for(8000), 5000);
        assert_eq!(c.discount_for(-10), 0);
    }

    #[test]
    fn percentage_over_hundred_is_capped() {
        let c = coupon(CouponType::Percentage, 250);
        assert_eq!(c.discount_for(400), 400);
    }

    #[test]
    fn percentage_of_a_huge_subtotal_does_not_overflow() {
        let c = coupon(CouponType::Percentage, 50);
        assert_eq!(c.discount_for(i64::MAX), i64::MAX / 2);
    }

    #[test]
    fn line_total_reports_overflow() {
        let line = CartItem {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Lamp".into(),
            unit_price: i64::MAX / 2,
            quantity: 3,
            created_at: Utc::now(),
        };
        assert_eq!(line.line_total(), None);
        let line = CartItem { quantity: 2, ..line };
        assert_eq!(line.line_total(), Some(i64::MAX - 1));
    }

    #[test]
    fn role_helpers_follow_the_role() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Sam".into(),
            last_name: "Seller".into(),
            email: "sam@example.com".into(),
            password_hash: String::new(),
            role: Role::Seller,
            created_at: now,
            updated_at: now,
        };
        assert!(user.is_seller());
        assert!(!user.is_admin());
        assert!(!user.is_client());
    }

    #[test]
    fn coupon_usability_rules() {
        let now = Utc::now();
        let mut c = coupon(CouponType::Fixed, 100);
        c.min_cart_value = Some(1000);
        assert_eq!(
            c.check_usable(now, 999),
            Err(CouponRejection::BelowMinimum { minimum: 1000 })
        );
        assert_eq!(c.check_usable(now, 1000), Ok(()));

        c.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(c.check_usable(now, 5000), Err(CouponRejection::Expired));

        c.expires_at = None;
        c.active = false;
        assert_eq!(c.check_usable(now, 5000), Err(CouponRejection::Inactive));
    }
}
