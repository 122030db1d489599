// User record store
//
// In-process implementation of the user store the auth endpoints rely on.
// Token redemption and the change it authorizes happen under one write lock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{NewUser, UpdateProfileRequest, User, UserStatus},
    one_time::OneTimeToken,
};
use crate::validation::normalize_email;

/// User repository backed by a shared in-memory map
#[derive(Clone, Default)]
pub struct UserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl UserRepository {
    /// Create an empty UserRepository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new user; email (case-insensitive) and phone must be unused
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let email = normalize_email(&new_user.email);
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.email == email || u.phone == new_user.phone);
        if taken {
            return Err(AuthError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email,
            phone: new_user.phone,
            role: new_user.role,
            status: UserStatus::Active,
            is_verified: false,
            gold_member: false,
            avatar_url: None,
            location: new_user.location,
            password_hash: new_user.password_hash,
            password_reset: None,
            email_verification: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        debug!("Stored user {}", user.id);

        Ok(user)
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        users.values().find(|u| u.email == email).cloned()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    /// Apply the user-editable profile fields that are present
    pub async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Option<User> {
        self.modify(id, |user| {
            if let Some(name) = update.name {
                user.name = name;
            }
            if let Some(avatar_url) = update.avatar_url {
                user.avatar_url = Some(avatar_url);
            }
            if let Some(location) = update.location {
                user.location = location;
            }
        })
        .await
    }

    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> Option<User> {
        self.modify(id, |user| user.status = status).await
    }

    /// Attach a password reset record, replacing any earlier one
    pub async fn store_password_reset(&self, id: Uuid, record: OneTimeToken) -> Option<User> {
        self.modify(id, |user| user.password_reset = Some(record)).await
    }

    /// Attach an email verification record, replacing any earlier one
    pub async fn store_email_verification(&self, id: Uuid, record: OneTimeToken) -> Option<User> {
        self.modify(id, |user| user.email_verification = Some(record)).await
    }

    /// Consume a password reset token and install the new password hash
    ///
    /// Returns None when no user holds a redeemable record for `presented`.
    pub async fn redeem_password_reset(
        &self,
        presented: &str,
        now: DateTime<Utc>,
        new_password_hash: String,
    ) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.values_mut().find(|u| {
            u.password_reset
                .as_ref()
                .is_some_and(|record| record.is_redeemable(presented, now))
        })?;

        user.password_reset = None;
        user.password_hash = new_password_hash;
        user.updated_at = now;
        Some(user.clone())
    }

    /// Consume an email verification token and mark the address verified
    pub async fn redeem_email_verification(
        &self,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.values_mut().find(|u| {
            u.email_verification
                .as_ref()
                .is_some_and(|record| record.is_redeemable(presented, now))
        })?;

        user.email_verification = None;
        user.is_verified = true;
        user.updated_at = now;
        Some(user.clone())
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id)?;
        change(user);
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{Location, Role};
    use chrono::Duration;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role: Role::Customer,
            location: Location::default(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();

        assert_eq!(user.status, UserStatus::Active);
        assert!(!user.is_verified);
        assert_eq!(repo.find_by_id(user.id).await.unwrap().email, "a@example.com");
        assert_eq!(repo.find_by_email("A@Example.com").await.unwrap().id, user.id);
        assert!(repo.find_by_email("b@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_or_phone_is_rejected() {
        let repo = UserRepository::new();
        repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();

        let same_email = repo.create_user(new_user("A@EXAMPLE.COM", "0799999999")).await;
        assert!(matches!(same_email, Err(AuthError::UserAlreadyExists)));

        let same_phone = repo.create_user(new_user("b@example.com", "0712345678")).await;
        assert!(matches!(same_phone, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_non_ascii_email_matches_in_any_case() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@ÉXAMPLE.com", "0712345678")).await.unwrap();

        assert_eq!(user.email, "a@éxample.com");
        assert_eq!(repo.find_by_email("a@ÉXAMPLE.com").await.unwrap().id, user.id);
        assert_eq!(repo.find_by_email("A@éxample.com").await.unwrap().id, user.id);

        let same_email = repo.create_user(new_user("a@Éxample.com", "0799999999")).await;
        assert!(matches!(same_email, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_update_profile_touches_only_given_fields() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();

        let updated = repo
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, user.email);
        assert!(updated.avatar_url.is_none());
        assert!(repo.update_profile(Uuid::new_v4(), UpdateProfileRequest::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), now);
        repo.store_password_reset(user.id, record).await.unwrap();

        let redeemed = repo
            .redeem_password_reset(&token, now, "$argon2id$new".to_string())
            .await
            .unwrap();
        assert_eq!(redeemed.password_hash, "$argon2id$new");
        assert!(redeemed.password_reset.is_none());

        let again = repo
            .redeem_password_reset(&token, now, "$argon2id$newer".to_string())
            .await;
        assert!(again.is_none());
        assert_eq!(repo.find_by_id(user.id).await.unwrap().password_hash, "$argon2id$new");
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_not_redeemed() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();
        let issued = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), issued);
        repo.store_password_reset(user.id, record).await.unwrap();

        let late = repo
            .redeem_password_reset(&token, issued + Duration::hours(2), "$argon2id$new".to_string())
            .await;
        assert!(late.is_none());
        assert_eq!(
            repo.find_by_id(user.id).await.unwrap().password_hash,
            "$argon2id$placeholder"
        );
    }

    #[tokio::test]
    async fn test_new_reset_replaces_old_one() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();
        let now = Utc::now();
        let (old_token, old_record) = OneTimeToken::issue(Duration::hours(1), now);
        let (new_token, new_record) = OneTimeToken::issue(Duration::hours(1), now);
        repo.store_password_reset(user.id, old_record).await.unwrap();
        repo.store_password_reset(user.id, new_record).await.unwrap();

        assert!(repo.redeem_password_reset(&old_token, now, "x".into()).await.is_none());
        assert!(repo.redeem_password_reset(&new_token, now, "y".into()).await.is_some());
    }

    #[tokio::test]
    async fn test_email_verification_marks_verified_once() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(24), now);
        repo.store_email_verification(user.id, record).await.unwrap();

        let verified = repo.redeem_email_verification(&token, now).await.unwrap();
        assert!(verified.is_verified);
        assert!(verified.email_verification.is_none());
        assert!(repo.redeem_email_verification(&token, now).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_redemption_succeeds_once() {
        let repo = UserRepository::new();
        let user = repo.create_user(new_user("a@example.com", "0712345678")).await.unwrap();
        let now = Utc::now();
        let (token, record) = OneTimeToken::issue(Duration::hours(1), now);
        repo.store_password_reset(user.id, record).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    repo.redeem_password_reset(&token, now, format!("hash-{}", i)).await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
