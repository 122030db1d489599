// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::password::PasswordRule;
use crate::error::ErrorResponse;

/// Authentication and authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    // Guard failures
    /// Missing, malformed, tampered or expired session token.
    /// Deliberately carries no cause.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Authorization header must start with Bearer")]
    InvalidHeader,

    /// Valid token whose role is not allowed on the route
    #[error("Insufficient permissions")]
    Forbidden,

    // Password policy
    #[error("Password does not meet requirements")]
    WeakPassword(Vec<PasswordRule>),

    // Request and account errors
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is suspended or banned")]
    AccountDisabled,

    #[error("User with this email or phone already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("No valid fields to update")]
    NothingToUpdate,

    #[error("Email address is already verified")]
    EmailAlreadyVerified,

    /// Unknown, expired or already consumed reset / verification token
    #[error("Invalid or expired token")]
    InvalidOneTimeToken,

    // Internal failures, details never reach the client
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidHeader
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden | AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            AuthError::WeakPassword(_)
            | AuthError::Validation(_)
            | AuthError::NothingToUpdate
            | AuthError::InvalidOneTimeToken => StatusCode::BAD_REQUEST,
            AuthError::UserAlreadyExists | AuthError::EmailAlreadyVerified => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code sent to clients
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::InvalidHeader => "INVALID_HEADER",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            AuthError::UserAlreadyExists => "CONFLICT",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::NothingToUpdate => "NOTHING_TO_UPDATE",
            AuthError::EmailAlreadyVerified => "ALREADY_VERIFIED",
            AuthError::InvalidOneTimeToken => "INVALID_TOKEN",
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::Validation(_) => "Request validation failed".to_string(),
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AuthError::WeakPassword(violations) => serde_json::to_value(violations).ok(),
            AuthError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => error!("{}", self),
            AuthError::Unauthenticated
            | AuthError::InvalidHeader
            | AuthError::Forbidden
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => warn!("Rejected request: {}", self),
            _ => debug!("Client error: {}", self),
        }

        let mut body = ErrorResponse::new(self.error_code(), self.error_message());
        if let Some(details) = self.details() {
            body = body.with_details(details);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidHeader.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::WeakPassword(vec![PasswordRule::Digit]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::UserAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::TokenGeneration("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AuthError::PasswordHash("salt failure at argon2 layer".into());
        assert_eq!(err.error_message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_weak_password_details_list_rules() {
        let err = AuthError::WeakPassword(vec![PasswordRule::Uppercase, PasswordRule::Digit]);
        let details = err.details().unwrap();
        assert_eq!(details, serde_json::json!(["uppercase", "digit"]));
    }

    #[tokio::test]
    async fn test_into_response_status() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
