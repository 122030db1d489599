// Authentication module
// Session tokens, role guards, password policy and the auth endpoints built on them

pub mod error;
pub mod handlers;
pub mod links;
pub mod middleware;
pub mod models;
pub mod one_time;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use links::{link_channel, LinkKind, LinkSender, OutboundLink};
pub use middleware::{AuthenticatedRequest, AuthenticatedUser, Guarded, RequestContext, RoleGuard};
pub use models::{Identity, Role, User, UserResponse, UserStatus};
pub use password::{PasswordReport, PasswordRule, PasswordService};
pub use repository::UserRepository;
pub use service::AuthService;
pub use token::{extract_bearer, issue_opaque_token, Claims, TokenService};
