//! Parameterised SQL, one module per table. Functions take any executor so
//! the services can run them on the pool or inside a transaction.

pub mod address_repository;
pub mod cart_repository;
pub mod coupon_repository;
pub mod log_repository;
pub mod order_repository;
pub mod product_repository;
pub mod user_repository;
