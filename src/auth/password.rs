// Password hashing and strength policy

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::auth::error::AuthError;

/// Minimum number of characters a password must have
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters accepted by the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A single password strength rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    SpecialCharacter,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 5] = [
        PasswordRule::MinLength,
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::SpecialCharacter,
    ];

    fn is_satisfied_by(self, password: &str) -> bool {
        match self {
            PasswordRule::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            PasswordRule::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            PasswordRule::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            PasswordRule::Digit => password.chars().any(|c| c.is_ascii_digit()),
            PasswordRule::SpecialCharacter => {
                password.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
            }
        }
    }

    /// Message shown to users for a violated rule
    pub fn message(self) -> &'static str {
        match self {
            PasswordRule::MinLength => "Password must be at least 8 characters long",
            PasswordRule::Uppercase => "Password must contain at least one uppercase letter",
            PasswordRule::Lowercase => "Password must contain at least one lowercase letter",
            PasswordRule::Digit => "Password must contain at least one number",
            PasswordRule::SpecialCharacter => {
                "Password must contain at least one special character"
            }
        }
    }
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of checking a password against every rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PasswordReport {
    pub valid: bool,
    pub violations: Vec<PasswordRule>,
}

/// Check a password against every rule; all violations are reported, in rule order
pub fn validate(password: &str) -> PasswordReport {
    let violations: Vec<PasswordRule> = PasswordRule::ALL
        .into_iter()
        .filter(|rule| !rule.is_satisfied_by(password))
        .collect();

    PasswordReport {
        valid: violations.is_empty(),
        violations,
    }
}

/// Like `validate`, but fails with `WeakPassword` when any rule is violated
pub fn enforce(password: &str) -> Result<(), AuthError> {
    let report = validate(password);
    if report.valid {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(report.violations))
    }
}

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only an unparseable hash is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Spend the same argon2 work as a real verification and always fail
    ///
    /// Used when no account matches, so response time does not reveal
    /// which emails are registered.
    pub fn verify_against_dummy(password: &str) -> bool {
        static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
        let dummy = DUMMY_HASH.get_or_init(|| Self::hash_password("dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = Self::verify_password(password, hash);
        }
        false
    }
}
