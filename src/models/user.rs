use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::validation::{check_password, is_valid_email, ValidationErrors};

/// Marketplace roles. Every account carries exactly one.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Farmer,
    Supplier,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Farmer => write!(f, "farmer"),
            UserRole::Supplier => write!(f, "supplier"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "farmer" => Some(UserRole::Farmer),
            "supplier" => Some(UserRole::Supplier),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// User profile document, one per account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// None for Google-only accounts. Never leaves the service layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>, // "local" or "google"
    #[serde(default)]
    pub is_email_verified: bool,
    // Farmer-specific fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_location: Option<String>,
    // Supplier-specific fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_license: Option<String>,
    /// Supplier vetting flag, set by admins out-of-band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: String,
    // Farmer-specific fields
    pub farm_name: Option<String>,
    pub farm_size: Option<f64>,
    pub farm_location: Option<String>,
    // Supplier-specific fields
    pub business_name: Option<String>,
    pub business_license: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().len() < 2 {
            errors.add("name", "Name must be at least 2 characters");
        } else if self.name.len() > 100 {
            errors.add("name", "Name cannot exceed 100 characters");
        }
        if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email address");
        }
        if let Some(message) = check_password(&self.password) {
            errors.add("password", message);
        }
        if UserRole::parse(&self.role).is_none() {
            errors.add("role", "Role must be one of: farmer, supplier, admin");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email address");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct NewPasswordRequest {
    pub oob_code: String,
    pub new_password: String,
}

impl NewPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.oob_code.is_empty() {
            errors.add("oob_code", "Reset code is required");
        }
        if let Some(message) = check_password(&self.new_password) {
            errors.add("new_password", message);
        }
        errors.into_result()
    }
}

/// Public projection of a user, safe for any response body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            uid: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_email_verified: user.is_email_verified,
            photo_url: user.photo_url,
            phone: user.phone,
            farm_name: user.farm_name,
            farm_location: user.farm_location,
            business_name: user.business_name,
            verified: user.verified,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: UserInfo,
}

/// Password reset token document, single use.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordReset {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub email: String,
    pub token: String,
    pub expires_at: BsonDateTime,
    pub created_at: BsonDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignupRequest {
        SignupRequest {
            name: "Maria Santos".into(),
            email: "maria@farm.example".into(),
            password: "Harvest2024".into(),
            phone: None,
            role: "farmer".into(),
            farm_name: Some("Santos Organics".into()),
            farm_size: Some(12.5),
            farm_location: None,
            business_name: None,
            business_license: None,
        }
    }

    #[test]
    fn test_signup_accepts_valid_request() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn test_signup_rejects_weak_password() {
        let mut request = signup();
        request.password = "lowercase1".into();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors[0].field, "password");
    }

    #[test]
    fn test_signup_rejects_unknown_role() {
        let mut request = signup();
        request.role = "wholesaler".into();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors[0].field, "role");
    }

    #[test]
    fn test_role_round_trip() {
        for role in ["farmer", "supplier", "admin"] {
            assert_eq!(UserRole::parse(role).unwrap().to_string(), role);
        }
        assert!(UserRole::parse("buyer").is_none());
    }
}
