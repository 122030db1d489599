// Out-of-band delivery of password reset and email verification links

use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    PasswordReset,
    EmailVerification,
}

impl LinkKind {
    /// Client path the token is appended to
    pub fn path(&self) -> &'static str {
        match self {
            LinkKind::PasswordReset => "/reset-password",
            LinkKind::EmailVerification => "/verify-email",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::PasswordReset => f.write_str("password reset"),
            LinkKind::EmailVerification => f.write_str("email verification"),
        }
    }
}

/// A one-time token addressed to a user, ready to be mailed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLink {
    pub user_id: Uuid,
    pub email: String,
    pub kind: LinkKind,
    pub token: String,
}

impl OutboundLink {
    pub fn url(&self) -> String {
        format!("{}?token={}", self.kind.path(), self.token)
    }
}

/// Hands issued links to whatever delivers them
pub trait LinkSender: Send + Sync {
    fn deliver(&self, link: OutboundLink);
}

impl LinkSender for UnboundedSender<OutboundLink> {
    fn deliver(&self, link: OutboundLink) {
        let user_id = link.user_id;
        if self.send(link).is_err() {
            warn!("Link delivery queue closed; dropped link for user {}", user_id);
        }
    }
}

/// Queue of links waiting for delivery
pub fn link_channel() -> (UnboundedSender<OutboundLink>, UnboundedReceiver<OutboundLink>) {
    mpsc::unbounded_channel()
}

/// Drain the queue into the log until every sender is gone
///
/// Stands in for a mail transport: the link is written where an operator
/// can forward it.
pub async fn log_links(mut links: UnboundedReceiver<OutboundLink>) {
    while let Some(link) = links.recv().await {
        info!("{} link for {}: {}", link.kind, link.email, link.url());
    }
}
