// Shared error response body
// Every error returned by the API renders into this JSON shape

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Consistent error response structure
///
/// Provides both a machine-readable code and a human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "UNAUTHENTICATED", "WEAK_PASSWORD")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details, omitted from JSON when None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
