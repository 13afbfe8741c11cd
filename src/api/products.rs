use actix_web::{web, HttpResponse};

use crate::api::{error_response, validation_response};
use crate::database::MongoDB;
use crate::models::{CreateProductRequest, ProductFilter, ProductResponse, UserRole};
use crate::services::auth_service::Claims;
use crate::services::product_service;

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(
        ("category" = Option<String>, Query, description = "Category filter"),
        ("min_price" = Option<f64>, Query, description = "Minimum price"),
        ("max_price" = Option<f64>, Query, description = "Maximum price"),
        ("is_organic" = Option<bool>, Query, description = "Organic products only"),
        ("search" = Option<String>, Query, description = "Name/description search"),
        ("supplier_id" = Option<String>, Query, description = "Supplier filter"),
        ("sort_by" = Option<String>, Query, description = "price_asc | price_desc | rating | newest"),
        ("limit" = Option<i64>, Query, description = "Page size (1-100, default 20)"),
        ("offset" = Option<i64>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Filtered product list"),
        (status = 400, description = "Invalid filters")
    )
)]
pub async fn get_products(db: web::Data<MongoDB>, query: web::Query<ProductFilter>) -> HttpResponse {
    log::info!(
        "🌾 GET /products - category: {:?}, sort: {:?}",
        query.category, query.sort_by
    );

    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }

    match product_service::list_products(&db, &query).await {
        Ok(products) => {
            let products: Vec<ProductResponse> =
                products.into_iter().map(ProductResponse::from).collect();
            log::info!("✅ Products retrieved: {}", products.len());
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": products,
                "total": products.len()
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to fetch products: {}", e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let product_id = path.into_inner();
    log::info!("🌾 GET /products/{}", product_id);

    match product_service::get_product(&db, &product_id).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": ProductResponse::from(product)
        })),
        Err(e) => {
            log::warn!("❌ Failed to fetch product {}: {}", product_id, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Suppliers only")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_product(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<CreateProductRequest>,
) -> HttpResponse {
    log::info!("🌾 POST /products - supplier: {}", user.sub);

    if user.role != UserRole::Supplier {
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Only suppliers can create products"
        }));
    }

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match product_service::create_product(&db, &user.sub, &user.name, &request).await {
        Ok(product) => {
            log::info!("✅ Product created: {}", product.name);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "data": ProductResponse::from(product),
                "message": "Product created successfully"
            }))
        }
        Err(e) => {
            log::error!("❌ Product creation failed for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}
