use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        auth::SessionUser,
        products::{
            CategoryList, CreateProductRequest, ProductDetail, ProductList, StockAdjustRequest,
            UpdateProductRequest,
        },
    },
    error::{AppError, AppResult},
    models::{LogType, Product, Role},
    repositories::product_repository::{self, NewProduct, ProductFilter},
    response::{ApiResponse, Empty, Meta},
    routes::params::{LowStockQuery, ProductQuery},
    services::log_service,
};

fn filter_from(query: &ProductQuery, seller_id: Option<Uuid>) -> ProductFilter {
    ProductFilter {
        q: query.q.clone(),
        category: query.category.clone(),
        min_price: query.min_price,
        max_price: query.max_price,
        seller_id,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    }
}

async fn list_filtered(
    pool: &DbPool,
    query: &ProductQuery,
    seller_id: Option<Uuid>,
) -> AppResult<ApiResponse<ProductList>> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_price must not exceed max_price".into(),
            ));
        }
    }
    let (page, limit, offset) = query.pagination().normalize();
    let filter = filter_from(query, seller_id);
    let items = product_repository::list(pool, &filter, limit, offset).await?;
    let total = product_repository::count(pool, &filter).await?;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_products(pool: &DbPool, query: ProductQuery) -> AppResult<ApiResponse<ProductList>> {
    list_filtered(pool, &query, None).await
}

pub async fn list_seller_products(
    pool: &DbPool,
    seller: &SessionUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    list_filtered(pool, &query, Some(seller.user_id)).await
}

pub async fn get_product(
    pool: &DbPool,
    viewer: Option<&SessionUser>,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = product_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", detail(product, viewer, Utc::now()), Some(Meta::empty())))
}

fn detail(product: Product, viewer: Option<&SessionUser>, now: DateTime<Utc>) -> ProductDetail {
    ProductDetail {
        available: product.available_for(viewer.map(|v| v.user_id), now),
        reserved: reserved(&product, now),
        product,
    }
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<CategoryList>> {
    let items = product_repository::categories(pool).await?;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

/// Loads a product the caller may manage: sellers only their own, admins any.
async fn find_managed(pool: &DbPool, user: &SessionUser, id: Uuid) -> AppResult<Product> {
    let product = product_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    match user.role {
        Role::Admin => Ok(product),
        Role::Seller if product.seller_id == user.user_id => Ok(product),
        // Hide other sellers' products entirely.
        Role::Seller => Err(AppError::NotFound),
        Role::Client => Err(AppError::Forbidden),
    }
}

pub async fn get_seller_product(
    pool: &DbPool,
    seller: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = find_managed(pool, seller, id).await?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn create_product(
    pool: &DbPool,
    seller: &SessionUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    let product = product_repository::insert(
        pool,
        NewProduct {
            seller_id: seller.user_id,
            name: &payload.name,
            description: &payload.description,
            category: &payload.category,
            price: payload.price,
            stock: payload.stock,
            image_url: payload.image_url.as_deref(),
        },
    )
    .await?;

    log_service::record(
        pool,
        LogType::Product,
        "product_create",
        Some(seller.user_id),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    pool: &DbPool,
    user: &SessionUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    let mut product = find_managed(pool, user, id).await?;

    if let Some(name) = payload.name {
        product.name = name.trim().to_string();
    }
    if let Some(description) = payload.description {
        product.description = description;
    }
    if let Some(category) = payload.category {
        product.category = category.trim().to_string();
    }
    if let Some(price) = payload.price {
        product.price = price;
    }
    if let Some(stock) = payload.stock {
        product.stock = stock;
    }
    if let Some(image_url) = payload.image_url {
        product.image_url = Some(image_url).filter(|u| !u.trim().is_empty());
    }

    let product = product_repository::save(pool, &product).await?;

    log_service::record(
        pool,
        LogType::Product,
        "product_update",
        Some(user.user_id),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;
    Ok(ApiResponse::success("Product updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    pool: &DbPool,
    user: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    let product = find_managed(pool, user, id).await?;
    if !product_repository::delete(pool, product.id).await? {
        return Err(AppError::NotFound);
    }

    log_service::record(
        pool,
        LogType::Product,
        "product_delete",
        Some(user.user_id),
        Some(serde_json::json!({ "product_id": id, "name": product.name })),
    )
    .await;
    Ok(ApiResponse::success("Product deleted", Empty::default(), Some(Meta::empty())))
}

pub async fn adjust_stock(
    pool: &DbPool,
    user: &SessionUser,
    id: Uuid,
    payload: StockAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    find_managed(pool, user, id).await?;

    let updated = product_repository::adjust_stock(pool, id, payload.delta)
        .await?
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    log_service::record(
        pool,
        LogType::Product,
        "inventory_adjust",
        Some(user.user_id),
        Some(serde_json::json!({ "product_id": updated.id, "delta": payload.delta })),
    )
    .await;
    Ok(ApiResponse::success("Inventory updated", updated, Some(Meta::empty())))
}

pub async fn list_low_stock(
    pool: &DbPool,
    default_threshold: i32,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let threshold = query.threshold.unwrap_or(default_threshold).max(0);
    let (page, limit, offset) = query.pagination().normalize();
    let items = product_repository::list_low_stock(pool, threshold, limit, offset).await?;
    let total = product_repository::count_low_stock(pool, threshold).await?;
    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Holds `quantity` units of `product_id` for `client_id` until `until`.
pub async fn reserve<'e>(
    db: impl PgExecutor<'e>,
    product_id: Uuid,
    client_id: Uuid,
    quantity: i32,
    until: DateTime<Utc>,
) -> AppResult<bool> {
    Ok(product_repository::reserve(db, product_id, client_id, quantity, until).await?)
}

/// Units under a live hold; a lapsed hold counts as zero.
pub fn reserved(product: &Product, now: DateTime<Utc>) -> i32 {
    if product.reservation_active(now) {
        product.reserved_quantity
    } else {
        0
    }
}

pub async fn release<'e>(db: impl PgExecutor<'e>, product_id: Uuid, client_id: Uuid) -> AppResult<()> {
    product_repository::release(db, product_id, client_id).await?;
    Ok(())
}

/// Takes `quantity` off the shelf or reports how many were available.
pub async fn decrement_stock<'e>(
    db: impl PgExecutor<'e>,
    product: &Product,
    quantity: i32,
) -> AppResult<()> {
    if !product_repository::decrement_stock(db, product.id, quantity).await? {
        return Err(AppError::InsufficientStock {
            product_id: product.id,
            available: product.stock,
        });
    }
    Ok(())
}

pub async fn release_expired_reservations(pool: &DbPool) -> AppResult<u64> {
    Ok(product_repository::release_expired(pool, Utc::now()).await?)
}

/// Periodically clears lapsed last-item holds.
pub fn spawn_reservation_sweeper(pool: DbPool, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match release_expired_reservations(&pool).await {
                Ok(0) => {}
                Ok(released) => tracing::debug!(released, "released expired reservations"),
                Err(err) => tracing::warn!(error = %err, "reservation sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn held_product(holder: Uuid, until: DateTime<Utc>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            name: "Desk Lamp".into(),
            description: String::new(),
            category: "home".into(),
            price: 8_900,
            image_url: None,
            stock: 2,
            reserved_quantity: 2,
            reserved_by: Some(holder),
            reserved_until: Some(until),
            created_at: now,
            updated_at: now,
        }
    }

    fn client(user_id: Uuid) -> SessionUser {
        SessionUser {
            user_id,
            role: Role::Client,
            first_name: "Cleo".into(),
        }
    }

    #[test]
    fn lapsed_hold_reserves_nothing() {
        let now = Utc::now();
        let holder = Uuid::new_v4();
        assert_eq!(reserved(&held_product(holder, now + Duration::seconds(60)), now), 2);
        assert_eq!(reserved(&held_product(holder, now - Duration::seconds(1)), now), 0);
    }

    #[test]
    fn detail_shows_availability_for_the_viewer() {
        let now = Utc::now();
        let holder = Uuid::new_v4();
        let product = || held_product(holder, now + Duration::seconds(60));

        let guest = detail(product(), None, now);
        assert_eq!((guest.available, guest.reserved), (0, 2));

        let owner = detail(product(), Some(&client(holder)), now);
        assert_eq!((owner.available, owner.reserved), (2, 2));

        let other = detail(product(), Some(&client(Uuid::new_v4())), now);
        assert_eq!(other.available, 0);
    }
}
