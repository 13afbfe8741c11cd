use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgriMarket Service API",
        version = "1.0.0",
        description = "API documentation for the AgriMarket agricultural marketplace. \n\n**Authentication:** Cart, order, OTP and admin endpoints require JWT Bearer token authentication.\n\n**Features:**\n- Multi-role accounts (farmer, supplier, admin) with local and Google sign-in\n- Email verification via 6-digit OTP codes\n- Product catalog with filtering and sorting\n- Shopping cart with computed totals\n- Checkout and order tracking\n- Product reviews with rating aggregation",
        contact(
            name = "AgriMarket Team",
            email = "support@agrimarket.example"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::reset_password,
        crate::api::auth::new_password,
        crate::api::auth::get_me,

        // OTP
        crate::api::otp::send_otp,
        crate::api::otp::verify_otp,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Products
        crate::api::products::get_products,
        crate::api::products::get_product,
        crate::api::products::create_product,

        // Cart
        crate::api::cart::get_cart,
        crate::api::cart::add_to_cart,
        crate::api::cart::update_cart_item,
        crate::api::cart::delete_from_cart,

        // Orders
        crate::api::orders::get_orders,
        crate::api::orders::create_order,
        crate::api::orders::get_order,
        crate::api::orders::update_order_status,

        // Reviews
        crate::api::reviews::create_review,
        crate::api::reviews::get_product_reviews,

        // Admin
        crate::api::admin::list_users,
        crate::api::admin::list_orders,
    ),
    components(
        schemas(
            // Auth
            crate::models::SignupRequest,
            crate::models::LoginRequest,
            crate::models::ResetPasswordRequest,
            crate::models::NewPasswordRequest,
            crate::models::AuthResponse,
            crate::models::UserInfo,
            crate::models::UserRole,

            // OTP
            crate::models::VerifyOtpRequest,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // Products
            crate::models::CreateProductRequest,
            crate::models::ProductResponse,
            crate::models::BulkPricing,

            // Cart
            crate::models::AddToCartRequest,
            crate::models::UpdateCartItemRequest,
            crate::models::CartView,
            crate::models::CartItem,

            // Orders
            crate::models::CreateOrderRequest,
            crate::models::CreateOrderPayment,
            crate::models::UpdateOrderStatusRequest,
            crate::models::OrderResponse,
            crate::models::OrderItem,
            crate::models::OrderStatus,
            crate::models::DeliveryInfo,
            crate::models::PaymentInfo,
            crate::models::PaymentMethod,
            crate::models::PaymentStatus,

            // Reviews
            crate::models::CreateReviewRequest,
            crate::models::ReviewResponse,
            crate::models::ProductReviews,
        )
    ),
    tags(
        (name = "Auth", description = "Account management: local email/password signup and login, Google sign-in, password reset."),
        (name = "OTP", description = "Email verification with 6-digit codes (10 minute expiry)."),
        (name = "Products", description = "Catalog browsing with filters and sorting; creation for suppliers."),
        (name = "Cart", description = "Per-user shopping cart with merge-on-add and computed totals."),
        (name = "Orders", description = "Checkout snapshots and order lifecycle tracking."),
        (name = "Reviews", description = "Product reviews with read-time rating aggregation."),
        (name = "Admin", description = "Role-guarded marketplace dashboards."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
