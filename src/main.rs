mod api;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    log::info!("🚀 Starting AgriMarket Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed the catalog when empty
    seeds::sample_products_seed::seed_sample_products(&db).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000") // Frontend web
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
                actix_web::http::header::PRAGMA,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints (public; /me is guarded per-route)
            .service(
                web::scope("/api/v1/auth")
                    .route("/signup", web::post().to(api::auth::signup))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/refresh", web::post().to(api::auth::refresh_token))
                    .route("/reset-password", web::post().to(api::auth::reset_password))
                    .route("/new-password", web::post().to(api::auth::new_password))
                    .route("/google", web::get().to(api::auth::google_auth))
                    .route("/callback", web::get().to(api::auth::google_callback))
                    .service(
                        web::resource("/me")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::get().to(api::auth::get_me)),
                    ),
            )
            // OTP email verification - Requires JWT
            .service(
                web::scope("/api/v1/otp")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/send", web::post().to(api::otp::send_otp))
                    .route("/verify", web::post().to(api::otp::verify_otp)),
            )
            // Products: supplier-guarded creation first (guarded resource only
            // claims POST, everything else falls through to the public scope)
            .service(
                web::resource("/api/v1/products")
                    .guard(actix_web::guard::Post())
                    .wrap(middleware::auth::AuthMiddleware)
                    .route(web::route().to(api::products::create_product)),
            )
            .service(
                web::scope("/api/v1/products")
                    .route("", web::get().to(api::products::get_products))
                    .route("/{id}", web::get().to(api::products::get_product)),
            )
            // Cart - Requires JWT
            .service(
                web::scope("/api/v1/cart")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::cart::get_cart))
                    .route("", web::post().to(api::cart::add_to_cart))
                    .route("", web::put().to(api::cart::update_cart_item))
                    .route("", web::delete().to(api::cart::delete_from_cart)),
            )
            // Orders - Requires JWT
            .service(
                web::scope("/api/v1/orders")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::orders::get_orders))
                    .route("", web::post().to(api::orders::create_order))
                    .route("/{id}", web::get().to(api::orders::get_order))
                    .route("/{id}/status", web::patch().to(api::orders::update_order_status)),
            )
            // Reviews: public reads, authenticated writes
            .service(
                web::scope("/api/v1/reviews")
                    .route(
                        "/product/{id}",
                        web::get().to(api::reviews::get_product_reviews),
                    )
                    .service(
                        web::resource("")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::post().to(api::reviews::create_review)),
                    ),
            )
            // Admin dashboards - Requires JWT + admin role
            .service(
                web::scope("/api/v1/admin")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/users", web::get().to(api::admin::list_users))
                    .route("/orders", web::get().to(api::admin::list_orders)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
