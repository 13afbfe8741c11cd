use actix_web::{web, HttpResponse};

use crate::api::error_response;
use crate::database::MongoDB;
use crate::models::{OrderResponse, UserRole};
use crate::services::auth_service::{self, Claims};
use crate::services::order_service;

fn require_admin(user: &Claims) -> Option<HttpResponse> {
    if user.role != UserRole::Admin {
        return Some(HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Admin access required"
        })));
    }
    None
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All user profiles"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🛡️ GET /admin/users - by: {}", user.sub);

    if let Some(forbidden) = require_admin(&user) {
        return forbidden;
    }

    match auth_service::list_users(&db).await {
        Ok(users) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": users,
            "total": users.len()
        })),
        Err(e) => {
            log::error!("❌ Failed to list users: {}", e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    tag = "Admin",
    responses(
        (status = 200, description = "All orders, newest first"),
        (status = 403, description = "Admin access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_orders(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("🛡️ GET /admin/orders - by: {}", user.sub);

    if let Some(forbidden) = require_admin(&user) {
        return forbidden;
    }

    match order_service::get_all_orders(&db).await {
        Ok(orders) => {
            let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": orders,
                "total": orders.len()
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to list orders: {}", e);
            error_response(e)
        }
    }
}
