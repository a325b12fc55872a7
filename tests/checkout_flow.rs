mod common;

use shopfront::{
    db::DbPool,
    dto::{
        addresses::AddressInput,
        auth::SessionUser,
        cart::{AddToCartRequest, UpdateCartItemRequest},
        coupons::CreateCouponRequest,
        orders::{AddressSelection, CheckoutRequest, OrderCreateDto, OrderLine},
    },
    error::AppError,
    models::{CouponType, OrderStatus, PaymentMethod, Product, Role},
    repositories::{
        coupon_repository,
        product_repository::{self, NewProduct},
    },
    services::{auth_service, cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

async fn user(pool: &DbPool, role: Role) -> anyhow::Result<SessionUser> {
    let email = format!("{}-{}@example.com", role.as_str(), Uuid::new_v4());
    let user = auth_service::create_account(pool, "Test", "User", &email, "password123", role).await?;
    Ok(SessionUser {
        user_id: user.id,
        role,
        first_name: user.first_name,
    })
}

async fn product(pool: &DbPool, seller: &SessionUser, price: i64, stock: i32) -> anyhow::Result<Product> {
    let name = format!("Widget {}", Uuid::new_v4());
    Ok(product_repository::insert(
        pool,
        NewProduct {
            seller_id: seller.user_id,
            name: &name,
            description: "for tests",
            category: "test",
            price,
            stock,
            image_url: None,
        },
    )
    .await?)
}

async fn stock_of(pool: &DbPool, id: Uuid) -> anyhow::Result<i32> {
    Ok(product_repository::find_by_id(pool, id)
        .await?
        .map(|p| p.stock)
        .unwrap_or(-1))
}

async fn coupon(pool: &DbPool, discount_type: CouponType, value: i64) -> anyhow::Result<String> {
    let code = format!("T{}", &Uuid::new_v4().simple().to_string()[..10]).to_uppercase();
    coupon_repository::insert(
        pool,
        &CreateCouponRequest {
            code: code.clone(),
            discount_type,
            value,
            min_cart_value: None,
            expires_at: None,
            active: true,
        },
    )
    .await?;
    Ok(code)
}

fn address() -> AddressInput {
    AddressInput {
        full_name: "Cleo Client".into(),
        street: "1 Market Street".into(),
        city: "Porto".into(),
        postal_code: "4000-001".into(),
        country: "PT".into(),
        phone: None,
    }
}

fn checkout_request(coupon_code: Option<String>) -> CheckoutRequest {
    CheckoutRequest {
        address_id: None,
        address: Some(address()),
        payment_method: PaymentMethod::Card,
        coupon_code,
    }
}

async fn add(state: &AppState, client: &SessionUser, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
    cart_service::add_item(state, client, AddToCartRequest { product_id, quantity })
        .await
        .map(|_| ())
}

#[tokio::test]
async fn checkout_places_order_takes_stock_and_empties_cart() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let widget = product(&state.pool, &seller, 1_000, 5).await?;
    let code = coupon(&state.pool, CouponType::Fixed, 300).await?;

    add(&state, &client, widget.id, 2).await?;
    let placed = cart_service::checkout(&state, &client, checkout_request(Some(code.to_lowercase())))
        .await?
        .data
        .expect("order");

    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.subtotal, 2_000);
    assert_eq!(placed.order.discount, 300);
    assert_eq!(placed.order.total, 1_700);
    assert_eq!(placed.order.coupon_code.as_deref(), Some(code.as_str()));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].product_name, widget.name);
    assert_eq!(placed.items[0].unit_price, 1_000);
    assert_eq!(placed.items[0].quantity, 2);
    assert_eq!(placed.address.as_ref().map(|a| a.city.as_str()), Some("Porto"));

    assert_eq!(stock_of(&state.pool, widget.id).await?, 3);
    let cart = cart_service::view_cart(&state, &client).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // A repeated submit finds nothing to order.
    let again = cart_service::checkout(&state, &client, checkout_request(None)).await;
    assert!(matches!(again, Err(AppError::BadRequest(msg)) if msg == "Cart is empty"));
    Ok(())
}

#[tokio::test]
async fn oversized_coupon_brings_total_to_zero() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let widget = product(&state.pool, &seller, 1_000, 5).await?;
    let code = coupon(&state.pool, CouponType::Fixed, 5_000).await?;

    add(&state, &client, widget.id, 1).await?;
    let placed = cart_service::checkout(&state, &client, checkout_request(Some(code)))
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.discount, 1_000);
    assert_eq!(placed.order.total, 0);
    Ok(())
}

#[tokio::test]
async fn failed_checkout_keeps_cart_and_stock() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let widget = product(&state.pool, &seller, 1_000, 5).await?;

    add(&state, &client, widget.id, 2).await?;
    let result = cart_service::checkout(&state, &client, checkout_request(Some("NOSUCHCODE".into()))).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(stock_of(&state.pool, widget.id).await?, 5);
    let cart = cart_service::view_cart(&state, &client).await?.data.expect("cart");
    assert_eq!(cart.item_count, 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_orders_for_the_last_unit_sell_it_once() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let first = user(&state.pool, Role::Client).await?;
    let second = user(&state.pool, Role::Client).await?;
    let lamp = product(&state.pool, &seller, 8_900, 1).await?;

    let dto = |client: &SessionUser| OrderCreateDto {
        client_id: client.user_id,
        address: AddressSelection::New(address()),
        payment_method: PaymentMethod::CashOnDelivery,
        coupon_code: None,
        lines: vec![OrderLine {
            product_id: lamp.id,
            quantity: 1,
        }],
    };
    let (a, b) = (dto(&first), dto(&second));
    let (ra, rb) = tokio::join!(
        order_service::create_order(&state.pool, &a),
        order_service::create_order(&state.pool, &b),
    );

    let successes = [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let failure = if ra.is_err() { ra.err() } else { rb.err() };
    assert!(matches!(failure, Some(AppError::InsufficientStock { .. })));
    assert_eq!(stock_of(&state.pool, lamp.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_from_one_client_both_count() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let tote = product(&state.pool, &seller, 2_500, 40).await?;

    let (first, second) = tokio::join!(
        add(&state, &client, tote.id, 1),
        add(&state, &client, tote.id, 2),
    );
    first?;
    second?;

    let cart = cart_service::view_cart(&state, &client).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.subtotal, 7_500);
    Ok(())
}

#[tokio::test]
async fn updating_a_line_that_is_not_in_the_cart_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let mug = product(&state.pool, &seller, 1_200, 10).await?;

    let missing = cart_service::update_item(&state, &client, mug.id, UpdateCartItemRequest { quantity: 2 }).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn taking_the_last_units_holds_them_for_that_client() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let first = user(&state.pool, Role::Client).await?;
    let second = user(&state.pool, Role::Client).await?;
    let notebook = product(&state.pool, &seller, 1_500, 2).await?;

    add(&state, &first, notebook.id, 2).await?;
    let held = product_repository::find_by_id(&state.pool, notebook.id)
        .await?
        .expect("product");
    assert_eq!(held.reserved_quantity, 2);
    assert_eq!(held.reserved_by, Some(first.user_id));

    let blocked = add(&state, &second, notebook.id, 1).await;
    assert!(matches!(blocked, Err(AppError::InsufficientStock { available: 0, .. })));

    // Dropping to one unit releases the hold.
    cart_service::update_item(&state, &first, notebook.id, UpdateCartItemRequest { quantity: 1 }).await?;
    add(&state, &second, notebook.id, 1).await?;
    Ok(())
}

#[tokio::test]
async fn cancelling_restocks_and_status_follows_the_lifecycle() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let seller = user(&state.pool, Role::Seller).await?;
    let client = user(&state.pool, Role::Client).await?;
    let admin = user(&state.pool, Role::Admin).await?;
    let mug = product(&state.pool, &seller, 1_200, 10).await?;

    add(&state, &client, mug.id, 3).await?;
    let first = cart_service::checkout(&state, &client, checkout_request(None))
        .await?
        .data
        .expect("order");
    assert_eq!(stock_of(&state.pool, mug.id).await?, 7);

    let cancelled = order_service::cancel_order(&state.pool, &client, first.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state.pool, mug.id).await?, 10);

    let twice = order_service::cancel_order(&state.pool, &client, first.order.id).await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));

    add(&state, &client, mug.id, 1).await?;
    let second = cart_service::checkout(&state, &client, checkout_request(None))
        .await?
        .data
        .expect("order");
    let id = second.order.id;

    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        order_service::update_order_status(&state.pool, &admin, id, status).await?;
    }
    let back = order_service::update_order_status(&state.pool, &admin, id, OrderStatus::Pending).await;
    assert!(matches!(back, Err(AppError::BadRequest(_))));

    let late_cancel = order_service::cancel_order(&state.pool, &client, id).await;
    assert!(matches!(late_cancel, Err(AppError::BadRequest(_))));

    // Another client cannot see the order.
    let stranger = user(&state.pool, Role::Client).await?;
    let hidden = order_service::get_order(&state.pool, &stranger, id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));
    Ok(())
}
