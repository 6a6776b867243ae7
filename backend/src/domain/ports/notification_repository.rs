//! Port for notification storage.

use async_trait::async_trait;

use crate::domain::{Audience, Notification, NotificationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// Notifications addressed to the audience's id or role, newest first.
    async fn list_for(
        &self,
        audience: &Audience,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    async fn count_unread(&self, audience: &Audience) -> Result<u64, NotificationRepositoryError>;

    /// Flag notifications addressed to the audience as read: the listed ids,
    /// or every unread one when `ids` is `None`. Returns how many changed.
    async fn mark_read(
        &self,
        audience: &Audience,
        ids: Option<Vec<NotificationId>>,
    ) -> Result<u64, NotificationRepositoryError>;
}
