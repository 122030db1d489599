pub mod auth;
pub mod config;
pub mod error;
pub mod validation;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{handlers, AuthService, RoleGuard};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_handler,
        handlers::login_handler,
        handlers::me_handler,
        handlers::update_me_handler,
        handlers::forgot_password_handler,
        handlers::reset_password_handler,
        handlers::request_verification_handler,
        handlers::verify_email_handler,
        handlers::update_status_handler,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::UserStatus,
            auth::models::Location,
            auth::models::UserResponse,
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::UpdateProfileRequest,
            auth::models::ForgotPasswordRequest,
            auth::models::ResetPasswordRequest,
            auth::models::VerifyEmailRequest,
            auth::models::UpdateStatusRequest,
            auth::models::AuthResponse,
            auth::models::MessageResponse,
            auth::password::PasswordRule,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login, password reset and email verification"),
        (name = "admin", description = "Staff account management")
    ),
    info(
        title = "Marketplace Auth API",
        version = "0.1.0",
        description = "Authentication and authorization for the service marketplace"
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Put `guard` in front of every route of `router`
fn guarded<S>(router: Router<S>, guard: RoleGuard) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(
        move |request: Request<Body>, next: Next| guard.clone().middleware(request, next),
    ))
}

/// Creates and configures the application router
pub fn create_router(service: Arc<AuthService>) -> Router {
    let tokens = service.token_service();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let account = guarded(
        Router::new()
            .route(
                "/api/auth/me",
                get(handlers::me_handler).put(handlers::update_me_handler),
            )
            .route(
                "/api/auth/verify-email/request",
                post(handlers::request_verification_handler),
            ),
        RoleGuard::any_role(tokens.clone()),
    );

    let admin = guarded(
        Router::new().route(
            "/api/admin/users/:id/status",
            patch(handlers::update_status_handler),
        ),
        RoleGuard::staff(tokens),
    );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/auth/register", post(handlers::register_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .route("/api/auth/forgot-password", post(handlers::forgot_password_handler))
        .route("/api/auth/reset-password", post(handlers::reset_password_handler))
        .route("/api/auth/verify-email", post(handlers::verify_email_handler))
        .merge(account)
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(service)
}
