// Service configuration
// Settings are read once at startup and passed into constructors explicitly

use chrono::Duration;
use std::fmt;
use thiserror::Error;

/// Session token lifetime used when JWT_EXPIRES_IN is not set
pub const DEFAULT_TOKEN_TTL: &str = "7d";

/// Password reset tokens are valid for one hour
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Email verification tokens are valid for one day
pub const EMAIL_VERIFICATION_TTL_SECS: i64 = 24 * 60 * 60;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Configuration errors raised while loading settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Application settings
#[derive(Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub email_verification_ttl: Duration,
    pub host: String,
    pub port: u16,
}

// The signing secret never ends up in logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .field("email_verification_ttl", &self.email_verification_ttl)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let raw_ttl = lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_TOKEN_TTL.to_string());
        let token_ttl = parse_ttl(&raw_ttl).map_err(|reason| ConfigError::Invalid {
            key: "JWT_EXPIRES_IN",
            reason,
        })?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            jwt_secret,
            token_ttl,
            reset_token_ttl: Duration::seconds(RESET_TOKEN_TTL_SECS),
            email_verification_ttl: Duration::seconds(EMAIL_VERIFICATION_TTL_SECS),
            host,
            port,
        })
    }

    /// Settings with the given secret and every other value at its default
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            token_ttl: Duration::days(7),
            reset_token_ttl: Duration::seconds(RESET_TOKEN_TTL_SECS),
            email_verification_ttl: Duration::seconds(EMAIL_VERIFICATION_TTL_SECS),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a lifetime such as `3600`, `90s`, `15m`, `12h` or `7d`
pub fn parse_ttl(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a duration", value))?;
    if amount <= 0 {
        return Err("duration must be positive".to_string());
    }

    let unit_secs = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    amount
        .checked_mul(unit_secs)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| format!("'{}' is too large", value))
}
