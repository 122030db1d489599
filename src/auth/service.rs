// Authentication service - business logic layer

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    links::{LinkKind, LinkSender, OutboundLink},
    models::{
        AuthResponse, LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, User,
        UserResponse, UserStatus,
    },
    one_time::OneTimeToken,
    password::{self, PasswordService},
    repository::UserRepository,
    token::TokenService,
};
use crate::config::Settings;
use crate::validation::{normalize_email, normalize_phone};

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: UserRepository,
    tokens: Arc<TokenService>,
    links: Arc<dyn LinkSender>,
    reset_token_ttl: Duration,
    email_verification_ttl: Duration,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(users: UserRepository, settings: &Settings, links: Arc<dyn LinkSender>) -> Self {
        Self {
            users,
            tokens: Arc::new(TokenService::from_settings(settings)),
            links,
            reset_token_ttl: settings.reset_token_ttl,
            email_verification_ttl: settings.email_verification_ttl,
        }
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        Arc::clone(&self.tokens)
    }

    /// Register a new customer or provider account
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;
        password::enforce(&request.password)?;

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: request.name.trim().to_string(),
                email: normalize_email(&request.email),
                phone: normalize_phone(&request.phone),
                role: request.role,
                location: request.location.unwrap_or_default(),
                password_hash,
            })
            .await?;

        info!("Registered user {} with role {}", user.id, user.role);
        self.auth_response(user)
    }

    /// Login a user
    ///
    /// Unknown email and wrong password produce the same error. Account
    /// status is only revealed once the password has been checked.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let Some(user) = self.users.find_by_email(&request.email).await else {
            PasswordService::verify_against_dummy(&request.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify_password(&request.password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if user.status != UserStatus::Active {
            warn!("Login refused for {:?} user {}", user.status, user.id);
            return Err(AuthError::AccountDisabled);
        }

        info!("User {} logged in", user.id);
        self.auth_response(user)
    }

    /// Get current user information from the store, not from the token
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        self.users
            .find_by_id(user_id)
            .await
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;
        if request.is_empty() {
            return Err(AuthError::NothingToUpdate);
        }

        self.users
            .update_profile(user_id, request)
            .await
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .set_status(user_id, status)
            .await
            .ok_or(AuthError::UserNotFound)?;
        info!("User {} status set to {:?}", user.id, status);
        Ok(user.into())
    }

    /// Start a password reset
    ///
    /// Hands a reset link to the link sender when the email belongs to a
    /// user and does nothing otherwise. Callers must not reveal which.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await else {
            return Ok(());
        };

        let (token, record) = OneTimeToken::issue(self.reset_token_ttl, Utc::now());
        self.users
            .store_password_reset(user.id, record)
            .await
            .ok_or(AuthError::UserNotFound)?;

        info!("Password reset link issued for user {}", user.id);
        self.links.deliver(OutboundLink {
            user_id: user.id,
            email: user.email,
            kind: LinkKind::PasswordReset,
            token,
        });
        Ok(())
    }

    /// Finish a password reset; the token is consumed on success
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        password::enforce(new_password)?;

        let password_hash = PasswordService::hash_password(new_password)?;
        let user = self
            .users
            .redeem_password_reset(token, Utc::now(), password_hash)
            .await
            .ok_or(AuthError::InvalidOneTimeToken)?;

        info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    /// Send the caller an email verification link
    pub async fn request_email_verification(&self, user_id: Uuid) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)?;
        if user.is_verified {
            return Err(AuthError::EmailAlreadyVerified);
        }

        let (token, record) = OneTimeToken::issue(self.email_verification_ttl, Utc::now());
        self.users
            .store_email_verification(user.id, record)
            .await
            .ok_or(AuthError::UserNotFound)?;

        info!("Email verification link issued for user {}", user.id);
        self.links.deliver(OutboundLink {
            user_id: user.id,
            email: user.email,
            kind: LinkKind::EmailVerification,
            token,
        });
        Ok(())
    }

    /// Consume an email verification token and mark the account verified
    pub async fn verify_email(&self, token: &str) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .redeem_email_verification(token, Utc::now())
            .await
            .ok_or(AuthError::InvalidOneTimeToken)?;

        info!("Email verified for user {}", user.id);
        Ok(user.into())
    }

    fn auth_response(&self, user: User) -> Result<AuthResponse, AuthError> {
        let token = self.tokens.issue(user.id, &user.email, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }
}
