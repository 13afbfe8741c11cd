use actix_web::{web, HttpResponse};

use crate::api::validation_response;
use crate::database::MongoDB;
use crate::models::VerifyOtpRequest;
use crate::services::auth_service::Claims;
use crate::services::otp_service;

#[utoipa::path(
    post,
    path = "/api/v1/otp/send",
    tag = "OTP",
    responses(
        (status = 200, description = "Verification code sent"),
        (status = 500, description = "Email configuration error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_otp(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("📨 POST /otp/send - user: {}", user.sub);

    match otp_service::send_otp(&db, &user.sub, &user.email).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Verification code sent"
        })),
        Err(e) => {
            log::error!("❌ OTP send failed for {}: {}", user.sub, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/otp/verify",
    tag = "OTP",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified successfully"),
        (status = 400, description = "Invalid or expired code")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_otp(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse {
    log::info!("🔍 POST /otp/verify - user: {}", user.sub);

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match otp_service::verify_otp(&db, &user.sub, &request.code).await {
        Ok(result) if result.success => {
            log::info!("✅ Email verified for user {}", user.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": result.message
            }))
        }
        Ok(result) => {
            log::warn!("⚠️ OTP rejected for user {}: {}", user.sub, result.message);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": result.message
            }))
        }
        Err(e) => {
            log::error!("❌ OTP verification error for {}: {}", user.sub, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Failed to verify code"
            }))
        }
    }
}
