use shopfront::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    dto::coupons::CreateCouponRequest,
    models::{CouponType, Role},
    repositories::{
        coupon_repository,
        product_repository::{self, NewProduct, ProductFilter},
        user_repository,
    },
    services::auth_service,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Ada", "Admin", "admin@example.com", "admin1234", Role::Admin).await?;
    let seller_id =
        ensure_user(&pool, "Sam", "Seller", "seller@example.com", "seller1234", Role::Seller).await?;
    let client_id =
        ensure_user(&pool, "Cleo", "Client", "client@example.com", "client1234", Role::Client).await?;
    seed_products(&pool, seller_id).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Admin: {admin_id}, Seller: {seller_id}, Client: {client_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(user) = user_repository::find_by_email(pool, email).await? {
        println!("User {email} already present");
        return Ok(user.id);
    }
    let user =
        auth_service::create_account(pool, first_name, last_name, email, password, role).await?;
    println!("Created user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(pool: &DbPool, seller_id: Uuid) -> anyhow::Result<()> {
    let products = [
        ("Canvas Tote", "Heavy cotton everyday bag", "bags", 2_500, 40),
        ("Enamel Mug", "Camp mug, 350 ml", "kitchen", 1_200, 100),
        ("Linen Apron", "Stonewashed linen apron", "kitchen", 3_800, 15),
        ("Desk Lamp", "Warm light, brass finish", "home", 8_900, 1),
        ("Notebook Set", "Three dotted A5 notebooks", "stationery", 1_500, 3),
    ];

    let filter = ProductFilter {
        seller_id: Some(seller_id),
        ..Default::default()
    };
    let existing = product_repository::list(pool, &filter, 100, 0).await?;

    for (name, description, category, price, stock) in products {
        if existing.iter().any(|p| p.name == name) {
            continue;
        }
        product_repository::insert(
            pool,
            NewProduct {
                seller_id,
                name,
                description,
                category,
                price,
                stock,
                image_url: None,
            },
        )
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_coupons(pool: &DbPool) -> anyhow::Result<()> {
    let coupons = [
        ("WELCOME10", CouponType::Percentage, 10, None),
        ("FIVEOFF", CouponType::Fixed, 500, Some(2_000)),
    ];
    for (code, discount_type, value, min_cart_value) in coupons {
        if coupon_repository::find_by_code(pool, code).await?.is_some() {
            continue;
        }
        coupon_repository::insert(
            pool,
            &CreateCouponRequest {
                code: code.to_string(),
                discount_type,
                value,
                min_cart_value,
                expires_at: None,
                active: true,
            },
        )
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}
