use actix_web::{web, HttpResponse};
use base64::Engine;

use crate::api::{error_response, validation_response};
use crate::database::MongoDB;
use crate::models::{
    AuthResponse, LoginRequest, NewPasswordRequest, RefreshTokenRequest, ResetPasswordRequest,
    SignupRequest, UserInfo,
};
use crate::services::auth_service::{self, Claims};
use crate::utils::validation::is_valid_email;

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn signup(db: web::Data<MongoDB>, request: web::Json<SignupRequest>) -> HttpResponse {
    log::info!("📝 POST /auth/signup - email: {}, role: {}", request.email, request.role);

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match auth_service::signup(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Signup successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", request.email, e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in successfully", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            error_response(e)
        }
    }
}

pub async fn refresh_token(
    db: web::Data<MongoDB>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse {
    log::info!("🔄 POST /auth/refresh");

    match auth_service::refresh_token(&db, &request.refresh_token).await {
        Ok(response) => {
            log::info!("✅ Token refreshed");
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset email sent"),
        (status = 400, description = "Malformed email"),
        (status = 500, description = "Email configuration or relay error")
    )
)]
pub async fn reset_password(
    db: web::Data<MongoDB>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/reset-password");

    if !is_valid_email(&request.email) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Invalid email address"
        }));
    }

    match auth_service::request_password_reset(&db, &request.email).await {
        // Unknown accounts get the same response as known ones
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password reset email sent"
        })),
        Err(e) => {
            log::error!("❌ Password reset failed: {}", e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/new-password",
    tag = "Auth",
    request_body = NewPasswordRequest,
    responses(
        (status = 200, description = "Password has been successfully updated"),
        (status = 400, description = "Invalid or expired reset code")
    )
)]
pub async fn new_password(
    db: web::Data<MongoDB>,
    request: web::Json<NewPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/new-password");

    if let Err(errors) = request.validate() {
        return validation_response(errors);
    }

    match auth_service::confirm_password_reset(&db, &request).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Password has been successfully updated"
        })),
        Err(e) => {
            log::warn!("❌ Password reset confirmation failed: {}", e);
            error_response(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "User information retrieved", body = UserInfo),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(db: web::Data<MongoDB>, user: web::ReqData<Claims>) -> HttpResponse {
    log::info!("👤 GET /auth/me - user: {}", user.sub);

    match auth_service::get_current_user(&db, &user.sub).await {
        Ok(profile) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": profile
        })),
        Err(e) => {
            log::error!("❌ Failed to get user {}: {}", user.sub, e);
            error_response(e)
        }
    }
}

pub async fn google_auth() -> HttpResponse {
    log::info!("🔐 GET /auth/google - Generating OAuth URL");

    match auth_service::generate_google_oauth_url() {
        Ok(response) => {
            log::info!("✅ Google OAuth URL generated");
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::error!("❌ Failed to generate Google OAuth URL: {}", e);
            error_response(e)
        }
    }
}

use serde::Deserialize;

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    #[allow(dead_code)]
    state: Option<String>,
    error: Option<String>,
}

pub async fn google_callback(
    db: web::Data<MongoDB>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    log::info!("🔐 GET /auth/callback - Processing Google OAuth");

    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    if let Some(error) = &query.error {
        log::error!("❌ OAuth error: {}", error);
        return HttpResponse::Found()
            .append_header(("Location", format!("{}/auth-callback.html?error={}", frontend_url, error)))
            .finish();
    }

    let code = match &query.code {
        Some(c) => c,
        None => {
            log::error!("❌ No authorization code provided");
            return HttpResponse::Found()
                .append_header((
                    "Location",
                    format!("{}/auth-callback.html?error=no_code", frontend_url),
                ))
                .finish();
        }
    };

    match auth_service::handle_google_callback(&db, code).await {
        Ok(response) => {
            log::info!("✅ Google OAuth successful");

            // Decode the JWT payload to pass identity along in the redirect
            let token_parts: Vec<&str> = response.token.split('.').collect();
            if token_parts.len() < 2 {
                log::error!("❌ Invalid JWT token format");
                return HttpResponse::Found()
                    .append_header((
                        "Location",
                        format!("{}/auth-callback.html?error=invalid_token", frontend_url),
                    ))
                    .finish();
            }

            let payload_bytes = match base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(token_parts[1])
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("❌ Failed to decode JWT payload: {}", e);
                    return HttpResponse::Found()
                        .append_header((
                            "Location",
                            format!("{}/auth-callback.html?error=invalid_token", frontend_url),
                        ))
                        .finish();
                }
            };

            let payload: serde_json::Value = match serde_json::from_slice(&payload_bytes) {
                Ok(p) => p,
                Err(e) => {
                    log::error!("❌ Failed to parse JWT payload JSON: {}", e);
                    return HttpResponse::Found()
                        .append_header((
                            "Location",
                            format!("{}/auth-callback.html?error=invalid_token", frontend_url),
                        ))
                        .finish();
                }
            };

            let user_id = payload["sub"].as_str().unwrap_or("unknown");
            let email = payload["email"].as_str().unwrap_or("unknown@email.com");
            let name = payload["name"].as_str().unwrap_or("");

            let redirect_url = format!(
                "{}/auth-callback.html?access_token={}&user_id={}&email={}&name={}",
                frontend_url,
                response.token,
                urlencoding::encode(user_id),
                urlencoding::encode(email),
                urlencoding::encode(name)
            );

            HttpResponse::Found()
                .append_header(("Location", redirect_url))
                .finish()
        }
        Err(e) => {
            log::error!("❌ Google OAuth failed: {}", e);
            HttpResponse::Found()
                .append_header((
                    "Location",
                    format!(
                        "{}/auth-callback.html?error={}",
                        frontend_url,
                        urlencoding::encode(&e.to_string())
                    ),
                ))
                .finish()
        }
    }
}
