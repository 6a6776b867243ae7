//! Driving port for notification writes.

use async_trait::async_trait;

use crate::domain::{Actor, Error, NewNotification, Notification, NotificationId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Store an explicitly sent notification.
    async fn send(&self, notification: NewNotification) -> Result<Notification, Error>;

    /// Mark the listed notifications, or all unread ones when `ids` is
    /// `None`, as read for the actor. Ids not addressed to the actor are
    /// ignored.
    async fn mark_read(&self, actor: &Actor, ids: Option<Vec<NotificationId>>)
    -> Result<u64, Error>;
}
