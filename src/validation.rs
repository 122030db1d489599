// Validation utilities module
// Custom validator functions for request DTOs

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::ValidationError;

use crate::auth::models::Role;

fn kenyan_phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\+254|0)[17]\d{8}$").expect("phone pattern is a valid regex")
    })
}

/// Strip whitespace from a phone number before validation and storage
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Canonical form of an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a Kenyan phone number: `+254` or `0`, then 7 or 1, then 8 digits.
/// Whitespace is ignored.
pub fn validate_kenyan_phone(phone: &str) -> Result<(), ValidationError> {
    if kenyan_phone_pattern().is_match(&normalize_phone(phone)) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from("Please enter a valid Kenyan phone number"));
        Err(error)
    }
}

/// Registration may only create customer or provider accounts
pub fn validate_signup_role(role: &Role) -> Result<(), ValidationError> {
    if role.is_self_service() {
        Ok(())
    } else {
        let mut error = ValidationError::new("role_not_allowed");
        error.message = Some(Cow::from("Role must be customer or provider"));
        Err(error)
    }
}
