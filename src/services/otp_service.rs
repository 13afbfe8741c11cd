use crate::{
    database::MongoDB,
    models::{OtpCode, User},
    services::email_service::EmailService,
};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use sha2::{Digest, Sha256};

const COLLECTION: &str = "otp_codes";
const OTP_TTL_MINUTES: i64 = 10;

/// Generate a random 6-digit verification code.
pub fn generate_otp() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// SHA-256 hex digest of a code. Only digests are persisted.
pub fn hash_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    Expired,
    Mismatch,
}

/// Pure verification step. Expiry wins over mismatch so the caller can tell
/// the user to request a new code. The submitted code is hashed and the
/// digests compared, which keeps the comparison independent of how much of
/// the secret matches.
pub fn check_code(stored_hash: &str, expires_at_millis: i64, now_millis: i64, input: &str) -> CodeCheck {
    if now_millis > expires_at_millis {
        return CodeCheck::Expired;
    }
    if hash_code(input) == stored_hash {
        CodeCheck::Valid
    } else {
        CodeCheck::Mismatch
    }
}

#[derive(Debug)]
pub struct OtpVerifyResult {
    pub success: bool,
    pub message: String,
}

/// Generate a fresh code for the user, overwrite any prior one, and email it.
/// A relay failure is logged and does not fail the call (the code stays
/// persisted); a missing SMTP configuration is surfaced to the caller.
pub async fn send_otp(db: &MongoDB, user_id: &str, email: &str) -> Result<(), String> {
    let code = generate_otp();
    let now = BsonDateTime::now();
    let expires_at =
        BsonDateTime::from_millis(now.timestamp_millis() + OTP_TTL_MINUTES * 60 * 1000);

    let otp = OtpCode {
        id: None,
        user_id: user_id.to_string(),
        email: email.to_string(),
        code_hash: hash_code(&code),
        expires_at,
        created_at: now,
    };

    let collection = db.collection::<OtpCode>(COLLECTION);
    collection
        .replace_one(doc! { "user_id": user_id }, &otp)
        .upsert(true)
        .await
        .map_err(|e| format!("Failed to store verification code: {}", e))?;

    log::debug!("OTP for {}: {}", email, code);

    // Transport built per call: a bad configuration must fail this request,
    // not prevent the whole service from starting.
    let mailer = EmailService::from_env().map_err(|e| e.to_string())?;

    if let Err(e) = mailer.send_otp_code(email, &code).await {
        log::error!("❌ Failed to send OTP email to {}: {}", email, e);
    }

    Ok(())
}

/// Compare the submitted code against the stored one. Success flips the
/// user's verified flag and burns the code; mismatch and expiry leave it in
/// place so the user can retry.
pub async fn verify_otp(db: &MongoDB, user_id: &str, code: &str) -> Result<OtpVerifyResult, String> {
    let collection = db.collection::<OtpCode>(COLLECTION);

    let stored = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let Some(stored) = stored else {
        return Ok(OtpVerifyResult {
            success: false,
            message: "Invalid or expired code".to_string(),
        });
    };

    let now = BsonDateTime::now().timestamp_millis();
    match check_code(&stored.code_hash, stored.expires_at.timestamp_millis(), now, code) {
        CodeCheck::Expired => Ok(OtpVerifyResult {
            success: false,
            message: "Code has expired. Please request a new one.".to_string(),
        }),
        CodeCheck::Mismatch => Ok(OtpVerifyResult {
            success: false,
            message: "Invalid code. Please try again.".to_string(),
        }),
        CodeCheck::Valid => {
            let users = db.collection::<User>("users");
            users
                .update_one(
                    doc! { "user_id": user_id },
                    doc! { "$set": {
                        "is_email_verified": true,
                        "updated_at": BsonDateTime::now(),
                    }},
                )
                .await
                .map_err(|e| format!("Failed to update user: {}", e))?;

            collection
                .delete_one(doc! { "user_id": user_id })
                .await
                .map_err(|e| format!("Failed to delete used code: {}", e))?;

            Ok(OtpVerifyResult {
                success: true,
                message: "Email verified successfully!".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_format() {
        let code = generate_otp();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_otp_range() {
        for _ in 0..100 {
            let code: u32 = generate_otp().parse().expect("valid number");
            assert!(code >= 100_000);
            assert!(code < 1_000_000);
        }
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let a = hash_code("123456");
        let b = hash_code("123456");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, hash_code("123457"));
    }

    #[test]
    fn test_check_code_valid_within_expiry() {
        let hash = hash_code("654321");
        assert_eq!(check_code(&hash, 10_000, 9_999, "654321"), CodeCheck::Valid);
        // Boundary: now == expires_at still verifies
        assert_eq!(check_code(&hash, 10_000, 10_000, "654321"), CodeCheck::Valid);
    }

    #[test]
    fn test_check_code_expired_wins_over_mismatch() {
        let hash = hash_code("654321");
        assert_eq!(check_code(&hash, 10_000, 10_001, "654321"), CodeCheck::Expired);
        assert_eq!(check_code(&hash, 10_000, 10_001, "000000"), CodeCheck::Expired);
    }

    #[test]
    fn test_check_code_mismatch() {
        let hash = hash_code("654321");
        assert_eq!(check_code(&hash, 10_000, 5_000, "123456"), CodeCheck::Mismatch);
    }
}
