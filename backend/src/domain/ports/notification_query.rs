//! Driving port for notification reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, Notification, RescueStatus};

/// Short description of the request a notification links to.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueRequestDigest {
    pub description: String,
    pub location: String,
    pub status: RescueStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    pub notification: Notification,
    pub rescue_request: Option<RescueRequestDigest>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQuery: Send + Sync {
    /// Notifications addressed to the actor, newest first.
    async fn list(&self, actor: &Actor, unread_only: bool) -> Result<Vec<NotificationView>, Error>;

    async fn unread_count(&self, actor: &Actor) -> Result<u64, Error>;
}
