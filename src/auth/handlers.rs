// HTTP handlers for authentication endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
        ResetPasswordRequest, UpdateProfileRequest, UpdateStatusRequest, UserResponse,
        VerifyEmailRequest,
    },
    service::AuthService,
};

const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input or weak password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email or phone already in use", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    tracing::debug!("Registering user with email: {}", request.email);
    let response = service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login a user
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 403, description = "Account suspended or banned", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    Ok(Json(service.login(request).await?))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 404, description = "User no longer exists", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    Ok(Json(service.current_user(identity.user_id).await?))
}

/// Update the caller's name, avatar or location
#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "No valid fields to update", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_me_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service.update_profile(identity.user_id, request).await?;
    tracing::info!("Profile updated for user {}", user.id);
    Ok(Json(user))
}

/// Request a password reset link
///
/// Always answers with the same message so the response does not reveal
/// whether the email is registered.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 400, description = "Invalid email", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    request.validate()?;
    service.forgot_password(&request.email).await?;
    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

/// Reset a password with a token from a reset link
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Weak password or invalid/expired token", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    request.validate()?;
    service.reset_password(&request.token, &request.password).await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

/// Send the caller an email verification link
#[utoipa::path(
    post,
    path = "/api/auth/verify-email/request",
    responses(
        (status = 200, description = "Verification link issued", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already verified", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn request_verification_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<MessageResponse>, AuthError> {
    service.request_email_verification(identity.user_id).await?;
    Ok(Json(MessageResponse::new("A verification link has been sent.")))
}

/// Confirm an email address with a token from a verification link
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = UserResponse),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_email_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    request.validate()?;
    Ok(Json(service.verify_email(&request.token).await?))
}

/// Change an account's status (staff only)
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/status",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_status_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    tracing::info!(
        "Staff user {} ({}) setting status of {} to {:?}",
        identity.user_id,
        identity.role,
        id,
        request.status
    );
    Ok(Json(service.set_status(id, request.status).await?))
}
