//! Notification storage and retrieval services.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use super::rescue_request_service::map_request_error;
use crate::domain::ports::{
    NotificationCommand, NotificationQuery, NotificationRepository, NotificationRepositoryError,
    NotificationView, RescueRequestDigest, RescueRequestRepository,
};
use crate::domain::{
    Actor, Audience, Error, NewNotification, Notification, NotificationId, RescueRequestId,
};

#[derive(Clone)]
pub struct NotificationService<N, R> {
    notifications: Arc<N>,
    requests: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<N, R> NotificationService<N, R> {
    pub fn new(notifications: Arc<N>, requests: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifications,
            requests,
            clock,
        }
    }
}

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

fn audience(actor: &Actor) -> Audience {
    Audience {
        user_id: actor.id.clone(),
        role: actor.role,
    }
}

#[async_trait]
impl<N, R> NotificationCommand for NotificationService<N, R>
where
    N: NotificationRepository,
    R: RescueRequestRepository,
{
    async fn send(&self, notification: NewNotification) -> Result<Notification, Error> {
        let notification = Notification::new(notification, self.clock.utc())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.notifications
            .insert(&notification)
            .await
            .map_err(map_notification_error)?;
        debug!(notification_id = %notification.id(), kind = %notification.kind(), "notification stored");
        Ok(notification)
    }

    async fn mark_read(
        &self,
        actor: &Actor,
        ids: Option<Vec<NotificationId>>,
    ) -> Result<u64, Error> {
        let ids = ids.filter(|ids| !ids.is_empty());
        self.notifications
            .mark_read(&audience(actor), ids)
            .await
            .map_err(map_notification_error)
    }
}

#[async_trait]
impl<N, R> NotificationQuery for NotificationService<N, R>
where
    N: NotificationRepository,
    R: RescueRequestRepository,
{
    async fn list(&self, actor: &Actor, unread_only: bool) -> Result<Vec<NotificationView>, Error> {
        let notifications = self
            .notifications
            .list_for(&audience(actor), unread_only)
            .await
            .map_err(map_notification_error)?;

        let mut digests: HashMap<RescueRequestId, Option<RescueRequestDigest>> = HashMap::new();
        for id in notifications
            .iter()
            .filter_map(Notification::rescue_request_id)
        {
            if digests.contains_key(&id) {
                continue;
            }
            let digest = self
                .requests
                .find_by_id(&id)
                .await
                .map_err(map_request_error)?
                .map(|request| RescueRequestDigest {
                    description: request.description().to_owned(),
                    location: request.location().to_owned(),
                    status: request.status(),
                });
            digests.insert(id, digest);
        }

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationView {
                rescue_request: notification
                    .rescue_request_id()
                    .and_then(|id| digests.get(&id).cloned().flatten()),
                notification,
            })
            .collect())
    }

    async fn unread_count(&self, actor: &Actor) -> Result<u64, Error> {
        self.notifications
            .count_unread(&audience(actor))
            .await
            .map_err(map_notification_error)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockNotificationRepository, MockRescueRequestRepository};
    use crate::domain::service_test_support::{
        actor_for, fixture_clock, fixture_timestamp, pending_request, user_with_role,
    };
    use crate::domain::{ErrorCode, NotificationTarget, RESCUE_ASSIGNED, Role};

    fn linked(request: Option<RescueRequestId>) -> Notification {
        Notification::new(
            NewNotification {
                kind: RESCUE_ASSIGNED.to_owned(),
                target: NotificationTarget::role(Role::Volunteer),
                content: "New assignment".to_owned(),
                rescue_request_id: request,
            },
            fixture_timestamp(),
        )
        .expect("valid notification")
    }

    #[rstest]
    #[tokio::test]
    async fn send_rejects_missing_content() {
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();
        let service = NotificationService::new(
            Arc::new(notifications),
            Arc::new(MockRescueRequestRepository::new()),
            fixture_clock(),
        );

        let err = service
            .send(NewNotification {
                kind: "NOTE".to_owned(),
                target: NotificationTarget::role(Role::Admin),
                content: String::new(),
                rescue_request_id: None,
            })
            .await
            .expect_err("content is required");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn list_attaches_digest_for_live_requests_only() {
        let volunteer = user_with_role(Role::Volunteer);
        let request = pending_request(volunteer.id());
        let live_id = request.id();
        let gone_id = RescueRequestId::random();
        let stored = vec![linked(Some(live_id)), linked(Some(gone_id)), linked(None)];

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_list_for()
            .returning(move |_, _| Ok(stored.clone()));
        let mut requests = MockRescueRequestRepository::new();
        requests.expect_find_by_id().returning(move |id| {
            Ok((*id == live_id).then(|| request.clone()))
        });
        let service =
            NotificationService::new(Arc::new(notifications), Arc::new(requests), fixture_clock());

        let views = service
            .list(&actor_for(&volunteer), false)
            .await
            .expect("listing succeeds");

        assert_eq!(views.len(), 3);
        assert_eq!(
            views[0].rescue_request.as_ref().map(|d| d.location.as_str()),
            Some("Harbour Road")
        );
        assert!(views[1].rescue_request.is_none());
        assert!(views[2].rescue_request.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn empty_id_list_marks_everything() {
        let reader = user_with_role(Role::TeamLeader);
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_mark_read()
            .withf(|audience, ids| audience.role == Role::TeamLeader && ids.is_none())
            .returning(|_, _| Ok(3));
        let service = NotificationService::new(
            Arc::new(notifications),
            Arc::new(MockRescueRequestRepository::new()),
            fixture_clock(),
        );

        let changed = service
            .mark_read(&actor_for(&reader), Some(Vec::new()))
            .await
            .expect("mark read succeeds");

        assert_eq!(changed, 3);
    }
}
