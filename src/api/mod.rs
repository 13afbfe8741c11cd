pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod otp;
pub mod products;
pub mod reviews;
pub mod swagger;

use crate::utils::error::AppError;
use actix_web::HttpResponse;

/// Map a service error onto the JSON envelope. Database details never reach
/// the client; everything else surfaces its user-facing message.
pub fn error_response(error: AppError) -> HttpResponse {
    match error {
        AppError::NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::InvalidRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::Forbidden(msg) => HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::Conflict(msg) => HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::EmailError(msg) => HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": msg
        })),
        AppError::DatabaseError(msg) => {
            log::error!("❌ Internal error: {}", msg);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            }))
        }
    }
}

/// 400 envelope for a failed request validation, with field-level details.
pub fn validation_response(errors: crate::utils::validation::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": "Validation failed",
        "details": errors.errors
    }))
}
