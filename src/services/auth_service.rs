use crate::{
    database::MongoDB,
    models::{
        AuthResponse, LoginRequest, NewPasswordRequest, PasswordReset, SignupRequest, User,
        UserInfo, UserRole,
    },
    services::email_service::{EmailError, EmailService},
    utils::error::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures::stream::StreamExt;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

const RESET_TTL_MINUTES: i64 = 60;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
    pub jti: String, // JWT ID
    pub aud: String, // audience
    pub iss: String, // issuer
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "agrimarket-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "agrimarket-api".to_string())
}

fn frontend_url() -> String {
    std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

// Generate JWT token
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        is_email_verified: user.is_email_verified,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to generate token: {}", e)))
}

// Generate refresh token (longer expiry)
pub fn generate_refresh_token(user_id: &str) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_string(),
        email: String::new(),
        name: String::new(),
        role: UserRole::Farmer,
        is_email_verified: false,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to generate refresh token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// Account creation (email + password)
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let role = UserRole::parse(&request.role)
        .ok_or_else(|| AppError::InvalidRequest("Invalid role".to_string()))?;

    if collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .is_some()
    {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let password_hash = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::DatabaseError(format!("Failed to hash password: {}", e)))?;

    let new_user_id = ObjectId::new().to_hex();
    let now = BsonDateTime::now();

    let new_user = User {
        id: None,
        user_id: new_user_id.clone(),
        name: request.name.clone(),
        email: request.email.clone(),
        password_hash: Some(password_hash),
        phone: request.phone.clone(),
        role,
        photo_url: None,
        google_id: None,
        provider: Some("local".to_string()),
        is_email_verified: false,
        farm_name: request.farm_name.clone(),
        farm_size: request.farm_size,
        farm_location: request.farm_location.clone(),
        business_name: request.business_name.clone(),
        business_license: request.business_license.clone(),
        // Suppliers start unvetted
        verified: if role == UserRole::Supplier { Some(false) } else { None },
        created_at: Some(now),
        updated_at: Some(now),
    };

    collection.insert_one(&new_user).await.map_err(|e| {
        // The unique email index closes the check-then-insert window
        if e.to_string().contains("E11000") {
            AppError::Conflict("Email already in use".to_string())
        } else {
            AppError::DatabaseError(format!("Failed to create user: {}", e))
        }
    })?;

    let token = generate_jwt(&new_user)?;
    let refresh_token = generate_refresh_token(&new_user_id)?;

    log::info!("✅ User registered: {} (role: {})", new_user.email, role);

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from(new_user),
    })
}

// Credential sign-in
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let stored_hash = user.password_hash.as_ref().ok_or_else(|| {
        AppError::Unauthorized(
            "This account uses Google login. Please sign in with Google.".to_string(),
        )
    })?;

    let valid = verify(&request.password, stored_hash)
        .map_err(|e| AppError::DatabaseError(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from(user),
    })
}

// Exchange a refresh token for a fresh pair
pub async fn refresh_token(db: &MongoDB, refresh_token: &str) -> Result<AuthResponse, AppError> {
    let claims = verify_token(refresh_token)?;

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": &claims.sub })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let token = generate_jwt(&user)?;
    let new_refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(new_refresh_token),
        user: UserInfo::from(user),
    })
}

// Get current user profile
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(UserInfo::from(user))
}

/// Every user profile, for the admin dashboard. Password hashes never leave
/// the `User` → `UserInfo` projection.
pub async fn list_users(db: &MongoDB) -> Result<Vec<UserInfo>, AppError> {
    let collection = db.collection::<User>("users");

    let mut cursor = collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(UserInfo::from(user)),
            Err(e) => log::error!("❌ Skipping unreadable user document: {}", e),
        }
    }
    Ok(users)
}

#[derive(Debug, Serialize)]
pub struct GoogleAuthUrlResponse {
    pub success: bool,
    pub auth_url: String,
    pub state: String,
}

// Generate Google OAuth URL
pub fn generate_google_oauth_url() -> Result<GoogleAuthUrlResponse, AppError> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| AppError::InvalidRequest("GOOGLE_CLIENT_ID not configured".to_string()))?;

    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:3002/api/v1/auth/callback".to_string());

    // State for CSRF protection
    let state = Uuid::new_v4().to_string();

    let params = vec![
        ("client_id", client_id.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", "openid email profile"),
        ("state", state.as_str()),
        ("access_type", "offline"),
        ("prompt", "select_account"),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!("https://accounts.google.com/o/oauth2/v2/auth?{}", query_string);

    Ok(GoogleAuthUrlResponse { success: true, auth_url, state })
}

// Handle Google OAuth callback
pub async fn handle_google_callback(db: &MongoDB, code: &str) -> Result<AuthResponse, AppError> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| AppError::InvalidRequest("GOOGLE_CLIENT_ID not configured".to_string()))?;
    let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
        .map_err(|_| AppError::InvalidRequest("GOOGLE_CLIENT_SECRET not configured".to_string()))?;
    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:3002/api/v1/auth/callback".to_string());

    // Exchange code for tokens
    let client = reqwest::Client::new();
    let token_response = client
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", code),
            ("client_id", &client_id),
            ("client_secret", &client_secret),
            ("redirect_uri", &redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AppError::Unauthorized(format!("Failed to exchange code: {}", e)))?;

    if !token_response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Failed to exchange authorization code".to_string(),
        ));
    }

    let tokens: serde_json::Value = token_response
        .json()
        .await
        .map_err(|e| AppError::Unauthorized(format!("Failed to parse token response: {}", e)))?;

    let access_token = tokens["access_token"]
        .as_str()
        .ok_or_else(|| AppError::Unauthorized("No access token in response".to_string()))?;

    // Get user info
    let user_info: serde_json::Value = client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| AppError::Unauthorized(format!("Failed to get user info: {}", e)))?
        .json()
        .await
        .map_err(|e| AppError::Unauthorized(format!("Failed to parse user info: {}", e)))?;

    let email = user_info["email"]
        .as_str()
        .ok_or_else(|| AppError::Unauthorized("No email in user info".to_string()))?;
    let name = user_info["name"].as_str().unwrap_or("User").to_string();
    let picture = user_info["picture"].as_str().map(String::from);
    let google_id = user_info["id"]
        .as_str()
        .ok_or_else(|| AppError::Unauthorized("No google_id in user info".to_string()))?;

    let user = upsert_google_user(db, google_id, email, &name, picture).await?;

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from(user),
    })
}

/// Single idempotent upsert keyed by the Google identity: one round trip
/// creates first-time users (default role farmer, email pre-verified) and
/// refreshes returning ones. A local account with the same email gets the
/// Google identity attached instead.
async fn upsert_google_user(
    db: &MongoDB,
    google_id: &str,
    email: &str,
    name: &str,
    picture: Option<String>,
) -> Result<User, AppError> {
    use mongodb::options::ReturnDocument;

    let collection = db.collection::<User>("users");
    let now = BsonDateTime::now();

    let update = doc! {
        "$set": {
            "name": name,
            "photo_url": picture.clone().map(mongodb::bson::Bson::String)
                .unwrap_or(mongodb::bson::Bson::Null),
            "provider": "google",
            "updated_at": now,
        },
        "$setOnInsert": {
            "user_id": ObjectId::new().to_hex(),
            "email": email,
            "role": "farmer",
            "is_email_verified": true,
            "created_at": now,
        },
    };

    let upserted = collection
        .find_one_and_update(doc! { "google_id": google_id }, update)
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await;

    match upserted {
        Ok(Some(user)) => {
            log::info!("✅ Google sign-in for user {}", user.user_id);
            Ok(user)
        }
        Ok(None) => Err(AppError::DatabaseError("Upsert returned no document".to_string())),
        // Unique email index fired: a local account owns this address.
        // Attach the Google identity to it instead.
        Err(e) if e.to_string().contains("E11000") => {
            let attached = collection
                .find_one_and_update(
                    doc! { "email": email },
                    doc! { "$set": {
                        "google_id": google_id,
                        "provider": "google",
                        "name": name,
                        "photo_url": picture.map(mongodb::bson::Bson::String)
                            .unwrap_or(mongodb::bson::Bson::Null),
                        "updated_at": now,
                    }},
                )
                .return_document(ReturnDocument::After)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?
                .ok_or_else(|| AppError::DatabaseError("User vanished during upsert".to_string()))?;
            log::info!("✅ Attached Google identity to existing account {}", attached.user_id);
            Ok(attached)
        }
        Err(e) => Err(AppError::DatabaseError(e.to_string())),
    }
}

/// Start a password reset. Unknown addresses still report success so the
/// endpoint cannot be used to enumerate accounts; SMTP problems are surfaced.
pub async fn request_password_reset(db: &MongoDB, email: &str) -> Result<(), AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    let Some(user) = user else {
        log::info!("🔒 Password reset requested for unknown email (not revealed to caller)");
        return Ok(());
    };

    let token = Uuid::new_v4().to_string();
    let now = BsonDateTime::now();
    let reset = PasswordReset {
        id: None,
        user_id: user.user_id.clone(),
        email: email.to_string(),
        token: token.clone(),
        expires_at: BsonDateTime::from_millis(
            now.timestamp_millis() + RESET_TTL_MINUTES * 60 * 1000,
        ),
        created_at: now,
    };

    db.collection::<PasswordReset>("password_resets")
        .replace_one(doc! { "user_id": &user.user_id }, &reset)
        .upsert(true)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to store reset token: {}", e)))?;

    let reset_url = format!("{}/new-password?oobCode={}", frontend_url(), token);

    let mailer = EmailService::from_env().map_err(|e| match e {
        EmailError::Config(msg) => AppError::EmailError(msg),
        other => AppError::EmailError(other.to_string()),
    })?;
    mailer
        .send_password_reset(email, &reset_url)
        .await
        .map_err(|e| AppError::EmailError(e.to_string()))?;

    log::info!("📧 Password reset email sent to {}", email);
    Ok(())
}

/// Finish a password reset: burn the token and store the new hash.
pub async fn confirm_password_reset(
    db: &MongoDB,
    request: &NewPasswordRequest,
) -> Result<(), AppError> {
    let resets = db.collection::<PasswordReset>("password_resets");

    let reset = resets
        .find_one(doc! { "token": &request.oob_code })
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?
        .ok_or_else(|| {
            AppError::InvalidRequest(
                "The password reset link is invalid. It may have already been used.".to_string(),
            )
        })?;

    if BsonDateTime::now().timestamp_millis() > reset.expires_at.timestamp_millis() {
        return Err(AppError::InvalidRequest(
            "The password reset link has expired. Please request a new one.".to_string(),
        ));
    }

    let password_hash = hash(&request.new_password, DEFAULT_COST)
        .map_err(|e| AppError::DatabaseError(format!("Failed to hash password: {}", e)))?;

    db.collection::<User>("users")
        .update_one(
            doc! { "user_id": &reset.user_id },
            doc! { "$set": {
                "password_hash": password_hash,
                "updated_at": BsonDateTime::now(),
            }},
        )
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update password: {}", e)))?;

    resets
        .delete_one(doc! { "token": &request.oob_code })
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to delete reset token: {}", e)))?;

    log::info!("🔑 Password updated for user {}", reset.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: None,
            user_id: "u-test-1".into(),
            name: "Maria Santos".into(),
            email: "maria@farm.example".into(),
            password_hash: None,
            phone: None,
            role: UserRole::Supplier,
            photo_url: None,
            google_id: None,
            provider: Some("local".into()),
            is_email_verified: true,
            farm_name: None,
            farm_size: None,
            farm_location: None,
            business_name: Some("Santos Supplies".into()),
            business_license: None,
            verified: Some(false),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let token = generate_jwt(&user()).expect("token");
        let claims = verify_token(&token).expect("claims");
        assert_eq!(claims.sub, "u-test-1");
        assert_eq!(claims.email, "maria@farm.example");
        assert_eq!(claims.role, UserRole::Supplier);
        assert!(claims.is_email_verified);
        assert_eq!(claims.aud, get_jwt_audience());
        assert_eq!(claims.iss, get_jwt_issuer());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_refresh_token_carries_subject() {
        let token = generate_refresh_token("u-test-1").expect("token");
        let claims = verify_token(&token).expect("claims");
        assert_eq!(claims.sub, "u-test-1");
    }

    #[test]
    fn test_user_info_hides_password_hash() {
        let mut u = user();
        u.password_hash = Some("$2b$12$secret".into());
        let info = UserInfo::from(u);
        let json = serde_json::to_string(&info).expect("serialize");
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }
}
