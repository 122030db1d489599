// Role guard for protected routes

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{
    error::AuthError,
    models::{Identity, Role},
    token::{extract_bearer, TokenService},
};

/// Authorization guard admitting only callers whose token carries one of
/// the allowed roles
#[derive(Clone)]
pub struct RoleGuard {
    tokens: Arc<TokenService>,
    allowed: Arc<HashSet<Role>>,
}

impl RoleGuard {
    pub fn new(tokens: Arc<TokenService>, allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            tokens,
            allowed: Arc::new(allowed.into_iter().collect()),
        }
    }

    pub fn admin(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Admin])
    }

    pub fn provider(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Provider])
    }

    pub fn customer(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Customer])
    }

    pub fn ops(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Ops])
    }

    pub fn finance(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Finance])
    }

    pub fn provider_or_customer(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Provider, Role::Customer])
    }

    /// Admin, ops and finance
    pub fn staff(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, [Role::Admin, Role::Ops, Role::Finance])
    }

    /// Any authenticated caller
    pub fn any_role(tokens: Arc<TokenService>) -> Self {
        Self::new(
            tokens,
            [Role::Customer, Role::Provider, Role::Admin, Role::Ops, Role::Finance],
        )
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    /// Check an Authorization header value
    ///
    /// A missing header, a header without the Bearer prefix and a bad or
    /// expired token all fail with `Unauthenticated`; a good token with a
    /// role outside the allowed set fails with `Forbidden`.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::Unauthenticated)?;
        let token = extract_bearer(header).map_err(|_| AuthError::Unauthenticated)?;
        let claims = self.tokens.verify(token)?;

        if !self.allows(claims.role) {
            debug!(
                "Role not allowed: user_id={}, role={}",
                claims.sub, claims.role
            );
            return Err(AuthError::Forbidden);
        }

        Ok(claims.into())
    }

    /// Wrap a handler so it only runs for authorized requests
    pub fn wrap<H>(&self, handler: H) -> Guarded<H> {
        Guarded {
            guard: self.clone(),
            handler,
        }
    }

    /// axum middleware: rejects the request or attaches `Identity` to its
    /// extensions before calling the next service
    pub async fn middleware(
        self,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        let identity = {
            let authorization = match request.headers().get(header::AUTHORIZATION) {
                Some(value) => Some(value.to_str().map_err(|_| {
                    debug!("Unreadable Authorization header for endpoint: {}", endpoint);
                    AuthError::Unauthenticated
                })?),
                None => None,
            };

            self.authorize(authorization)?
        };

        debug!(
            "Authorization successful: user_id={}, role={}, endpoint={}",
            identity.user_id, identity.role, endpoint
        );
        request.extensions_mut().insert(identity);
        Ok(next.run(request).await)
    }
}

/// Request as seen by a guarded handler before authorization
#[derive(Debug, Clone)]
pub struct RequestContext<T> {
    pub authorization: Option<String>,
    pub payload: T,
}

/// Request handed to the wrapped handler once authorization succeeded
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest<T> {
    pub identity: Identity,
    pub payload: T,
}

/// A handler wrapped by a `RoleGuard`
pub struct Guarded<H> {
    guard: RoleGuard,
    handler: H,
}

impl<H> Guarded<H> {
    /// Authorize the request, then run the handler; the handler is never
    /// invoked when authorization fails
    pub fn call<T, R>(&self, request: RequestContext<T>) -> Result<R, AuthError>
    where
        H: Fn(AuthenticatedRequest<T>) -> R,
    {
        let identity = self.guard.authorize(request.authorization.as_deref())?;
        Ok((self.handler)(AuthenticatedRequest {
            identity,
            payload: request.payload,
        }))
    }
}

/// Authenticated user extractor for routes behind `RoleGuard::middleware`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::Unauthenticated)
    }
}
