use actix_web::{web, HttpResponse};

use crate::api::{error_response, validation_response};
use crate::database::MongoDB;
use crate::models::{AddToCartRequest, CartDeleteQuery, CartView, UpdateCartItemRequest};
use crate::services::auth_service::Claims;
use crate::services::cart_service;

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Caller's cart with computed totals", body = CartView)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_cart(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🛒 GET /cart - user: {}", user.sub);

    match cart_service::get_cart(&db, &user.sub).await {
        Ok(cart) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": cart_service::view(&cart)
        })),
        Err(e) => {
            log::error!("❌ Failed to fetch cart for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/cart",
    tag = "Cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added to cart", body = CartView),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Product not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_to_cart(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<AddToCartRequest>,
) -> HttpResponse {
    log::info!(
        "🛒 POST /cart - user: {}, product: {}, qty: {}",
        user.sub, request.product_id, request.quantity
    );

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match cart_service::add_item(&db, &user.sub, &request).await {
        Ok(cart) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": cart_service::view(&cart),
            "message": "Item added to cart"
        })),
        Err(e) => {
            log::warn!("❌ Add to cart failed for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/cart",
    tag = "Cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart updated", body = CartView),
        (status = 404, description = "Cart or item not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_cart_item(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<UpdateCartItemRequest>,
) -> HttpResponse {
    log::info!(
        "🛒 PUT /cart - user: {}, product: {}, qty: {}",
        user.sub, request.product_id, request.quantity
    );

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match cart_service::update_item(&db, &user.sub, &request).await {
        Ok(cart) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": cart_service::view(&cart),
            "message": "Cart updated"
        })),
        Err(e) => {
            log::warn!("❌ Cart update failed for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

/// DELETE /cart?product_id=... removes one item; without the query parameter
/// the whole cart is cleared.
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    tag = "Cart",
    params(
        ("product_id" = Option<String>, Query, description = "Line item to remove; omit to clear the cart")
    ),
    responses(
        (status = 200, description = "Cart cleared or item removed"),
        (status = 404, description = "Cart not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_from_cart(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    query: web::Query<CartDeleteQuery>,
) -> HttpResponse {
    match &query.product_id {
        None => {
            log::info!("🛒 DELETE /cart - user: {} (clear)", user.sub);
            match cart_service::clear_cart(&db, &user.sub).await {
                Ok(()) => HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "message": "Cart cleared"
                })),
                Err(e) => {
                    log::error!("❌ Cart clear failed for {}: {}", user.sub, e);
                    error_response(e)
                }
            }
        }
        Some(product_id) => {
            log::info!("🛒 DELETE /cart - user: {}, product: {}", user.sub, product_id);
            match cart_service::remove_item(&db, &user.sub, product_id).await {
                Ok(cart) => HttpResponse::Ok().json(serde_json::json!({
                    "success": true,
                    "data": cart_service::view(&cart),
                    "message": "Item removed from cart"
                })),
                Err(e) => {
                    log::warn!("❌ Cart item removal failed for {}: {}", user.sub, e);
                    error_response(e)
                }
            }
        }
    }
}
