use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::validation::ValidationErrors;

/// Pending email verification code, one per user. Only the SHA-256 digest of
/// the 6-digit code is stored; the plaintext exists only in the send path.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OtpCode {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub email: String,
    pub code_hash: String,
    pub expires_at: BsonDateTime,
    pub created_at: BsonDateTime,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VerifyOtpRequest {
    pub code: String,
}

impl VerifyOtpRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.code.len() != 6 || !self.code.chars().all(|c| c.is_ascii_digit()) {
            errors.add("code", "Code must be 6 digits");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_shape() {
        assert!(VerifyOtpRequest { code: "123456".into() }.validate().is_ok());
        assert!(VerifyOtpRequest { code: "12345".into() }.validate().is_err());
        assert!(VerifyOtpRequest { code: "12345a".into() }.validate().is_err());
    }
}
