use actix_web::{web, HttpResponse};

use crate::api::{error_response, validation_response};
use crate::database::MongoDB;
use crate::models::{CreateOrderRequest, OrderResponse, OrderStatus, UpdateOrderStatusRequest};
use crate::services::auth_service::Claims;
use crate::services::order_service;

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Caller's orders, newest first")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_orders(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📦 GET /orders - user: {}", user.sub);

    match order_service::get_user_orders(&db, &user.sub).await {
        Ok(orders) => {
            let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": orders,
                "total": orders.len()
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to fetch orders for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Validation failed or cart is empty")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_order(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    log::info!("📦 POST /orders - user: {}", user.sub);

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match order_service::create_order(&db, &user.sub, &user.name, &user.email, &request).await {
        Ok(order) => {
            log::info!("✅ Order created: user {} total {:.2}", user.sub, order.total);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "data": OrderResponse::from(order),
                "message": "Order created successfully"
            }))
        }
        Err(e) => {
            log::warn!("❌ Order creation failed for {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    params(
        ("id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_order(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let order_id = path.into_inner();
    log::info!("📦 GET /orders/{} - user: {}", order_id, user.sub);

    match order_service::get_order(&db, &order_id, &user.sub, user.role).await {
        Ok(order) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": OrderResponse::from(order)
        })),
        Err(e) => {
            log::warn!("❌ Failed to fetch order {}: {}", order_id, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    tag = "Orders",
    params(
        ("id" = String, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = OrderResponse),
        (status = 403, description = "Not allowed to update this order"),
        (status = 404, description = "Order not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_order_status(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> HttpResponse {
    let order_id = path.into_inner();
    log::info!(
        "📦 PATCH /orders/{}/status - user: {}, status: {}",
        order_id, user.sub, request.status
    );

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }
    // validate() guarantees membership
    let Some(status) = OrderStatus::parse(&request.status) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Invalid status"
        }));
    };

    match order_service::update_status(
        &db,
        &order_id,
        &user.sub,
        user.role,
        status,
        request.tracking_number.clone(),
    )
    .await
    {
        Ok(order) => {
            log::info!("✅ Order {} moved to {}", order_id, status);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": OrderResponse::from(order),
                "message": "Order status updated"
            }))
        }
        Err(e) => {
            log::warn!("❌ Status update failed for order {}: {}", order_id, e);
            error_response(e)
        }
    }
}
