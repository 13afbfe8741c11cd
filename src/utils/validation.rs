use serde::Serialize;

/// One rejected field in a request body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulator for request validation. Handlers serialize the collected
/// errors into the `details` array of a 400 envelope.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Structural email check. Full RFC parsing happens in the mail transport;
/// this only rejects obviously malformed input before it hits the database.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Password policy: at least 8 chars with one uppercase, one lowercase and
/// one digit. Returns the first violated rule's message.
pub fn check_password(password: &str) -> Option<&'static str> {
    if password.len() < 8 {
        return Some("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("farmer@example.com"));
        assert!(is_valid_email("a.b+c@mail.co.uk"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user name@example.com"));
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(check_password("short1A"), Some("Password must be at least 8 characters"));
        assert_eq!(
            check_password("alllower1"),
            Some("Password must contain at least one uppercase letter")
        );
        assert_eq!(
            check_password("ALLUPPER1"),
            Some("Password must contain at least one lowercase letter")
        );
        assert_eq!(
            check_password("NoDigitsHere"),
            Some("Password must contain at least one number")
        );
        assert_eq!(check_password("GoodPass1"), None);
    }

    #[test]
    fn test_accumulator() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("email", "Invalid email address");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "email");
    }
}
