use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressInput, AddressList},
        auth::{LoginRequest, RegisterRequest, SessionUser},
        cart::{AddToCartRequest, ApplyCouponRequest, CartView, CouponPreview, UpdateCartItemRequest},
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
        logs::LogList,
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{
            CategoryList, CreateProductRequest, ProductDetail, ProductList, StockAdjustRequest,
            UpdateProductRequest,
        },
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    middleware::session::SESSION_COOKIE_NAME,
    models::{
        Address, CartItem, Coupon, CouponType, Log, LogType, Order, OrderItem, OrderStatus,
        PaymentMethod, Product, Role, User,
    },
    response::{ApiResponse, Empty, Meta},
    routes::{addresses, admin, auth, cart, health, orders, params, products, seller},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        products::list_products,
        products::list_categories,
        products::get_product,
        cart::view_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        cart::apply_coupon,
        cart::checkout,
        addresses::list_addresses,
        addresses::create_address,
        addresses::delete_address,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        seller::list_products,
        seller::create_product,
        seller::get_product,
        seller::update_product,
        seller::delete_product,
        seller::adjust_stock,
        seller::list_orders,
        admin::list_users,
        admin::create_user,
        admin::get_user,
        admin::update_user,
        admin::delete_user,
        admin::list_products,
        admin::delete_product,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_coupons,
        admin::create_coupon,
        admin::update_coupon,
        admin::delete_coupon,
        admin::list_logs
    ),
    components(
        schemas(
            Role,
            User,
            Product,
            CartItem,
            Address,
            OrderStatus,
            PaymentMethod,
            Order,
            OrderItem,
            CouponType,
            Coupon,
            LogType,
            Log,
            RegisterRequest,
            LoginRequest,
            SessionUser,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            CreateProductRequest,
            UpdateProductRequest,
            StockAdjustRequest,
            ProductDetail,
            ProductList,
            CategoryList,
            AddToCartRequest,
            UpdateCartItemRequest,
            ApplyCouponRequest,
            CartView,
            CouponPreview,
            AddressInput,
            AddressList,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            CreateCouponRequest,
            UpdateCouponRequest,
            CouponList,
            LogList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            health::HealthData,
            Meta,
            Empty,
            ApiResponse<Product>,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<User>,
            ApiResponse<Empty>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and session"),
        (name = "Products", description = "Public catalogue"),
        (name = "Cart", description = "Client cart and checkout"),
        (name = "Addresses", description = "Client shipping addresses"),
        (name = "Orders", description = "Client order history"),
        (name = "Seller", description = "Seller catalogue and orders"),
        (name = "Admin", description = "Back office"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
