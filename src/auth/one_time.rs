// Single-use tokens for password reset and email verification
//
// Only the SHA-256 hash of a token is kept on the user record; the plaintext
// leaves the service once, in the link sent to the user.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::auth::token::issue_opaque_token;

/// Hash a token using SHA-256, hex encoded
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stored half of a single-use token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeToken {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// Issue a fresh token; returns the plaintext and the record to store
    pub fn issue(ttl: Duration, now: DateTime<Utc>) -> (String, Self) {
        let token = issue_opaque_token();
        let record = Self {
            token_hash: hash_token(&token),
            expires_at: now + ttl,
        };
        (token, record)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when `presented` is this token and it has not expired
    pub fn is_redeemable(&self, presented: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.token_hash == hash_token(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_sha256() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_issue_stores_hash_not_plaintext() {
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), now);
        assert_ne!(record.token_hash, token);
        assert_eq!(record.token_hash, hash_token(&token));
        assert_eq!(record.expires_at, now + Duration::hours(1));
    }

    #[test]
    fn test_redeemable_before_expiry_only() {
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), now);

        assert!(record.is_redeemable(&token, now));
        assert!(record.is_redeemable(&token, now + Duration::minutes(59)));
        assert!(!record.is_redeemable(&token, now + Duration::hours(1)));
        assert!(!record.is_redeemable(&token, now + Duration::hours(2)));
    }

    #[test]
    fn test_other_tokens_are_not_redeemable() {
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), now);
        let (other, _) = OneTimeToken::issue(Duration::hours(1), now);

        assert!(!record.is_redeemable(&other, now));
        assert!(!record.is_redeemable(&record.token_hash, now));
        assert!(!record.is_redeemable(&token.to_uppercase(), now));
    }
}
