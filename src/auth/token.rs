// JWT token generation and validation service

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Identity, Role},
};
use crate::config::Settings;

/// Opaque tokens carry 32 bytes (256 bits) of entropy
pub const OPAQUE_TOKEN_BYTES: usize = 32;

const BEARER_PREFIX: &str = "Bearer ";

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user id
    pub email: String,
    pub role: Role,      // role at issuance time
    pub iat: i64,        // issued at timestamp
    pub exp: i64,        // expiration timestamp
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Token service for session JWT operations
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a new TokenService with a signing secret and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session token for a user
    pub fn issue(&self, subject: Uuid, email: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject, email, role, Utc::now())
    }

    /// Issue a session token as if the current time were `now`
    pub fn issue_at(
        &self,
        subject: Uuid,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject,
            email: email.to_string(),
            role,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify a session token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a session token as if the current time were `now`
    ///
    /// Bad signatures, malformed input and expiry all fail with the same
    /// `Unauthenticated` error. A token is valid up to and including its
    /// `exp` second.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock, with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Session token rejected: {}", e);
                AuthError::Unauthenticated
            })?;

        if now.timestamp() > claims.exp {
            debug!("Session token rejected: expired at {}", claims.exp);
            return Err(AuthError::Unauthenticated);
        }

        Ok(claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidHeader),
    }
}

/// Generate an unguessable single-use token (32 random bytes, hex encoded)
pub fn issue_opaque_token() -> String {
    let mut buffer = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}
