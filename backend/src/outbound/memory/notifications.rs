//! In-memory `NotificationRepository`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::POISONED;
use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Audience, Notification, NotificationId};

/// Append-only notification log.
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Notification>>, NotificationRepositoryError> {
        self.notifications
            .lock()
            .map_err(|_| NotificationRepositoryError::query(POISONED))
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        self.lock()?.push(notification.clone());
        Ok(())
    }

    async fn list_for(
        &self,
        audience: &Audience,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut visible: Vec<Notification> = self
            .lock()?
            .iter()
            .filter(|n| n.target().addresses(audience))
            .filter(|n| !unread_only || !n.is_read())
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(visible)
    }

    async fn count_unread(&self, audience: &Audience) -> Result<u64, NotificationRepositoryError> {
        let count = self
            .lock()?
            .iter()
            .filter(|n| n.target().addresses(audience) && !n.is_read())
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn mark_read(
        &self,
        audience: &Audience,
        ids: Option<Vec<NotificationId>>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut changed = 0;
        for notification in self.lock()?.iter_mut() {
            let selected = ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&notification.id()));
            if selected && !notification.is_read() && notification.target().addresses(audience) {
                notification.mark_read();
                changed += 1;
            }
        }
        Ok(changed)
    }
}
