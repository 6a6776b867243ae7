//! Rescue request lifecycle service.
//!
//! Orchestrates every mutation of a rescue request: load, transition check,
//! authorization against the stored state, field merge, persistence, then the
//! best-effort side channels (statistics counters and notifications). The
//! side channels run after the primary write and never fail the request; a
//! failure there is logged and the derived read path in
//! [`StatisticsService`](crate::domain::StatisticsService) absorbs the drift.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use super::account_service::map_user_error;
use crate::domain::ports::{
    CounterStore, CounterStoreError, CreateRescueRequest, NotificationRepository,
    NotificationRepositoryError, RescueRequestCommand, RescueRequestFilter, RescueRequestQuery,
    RescueRequestRepository, RescueRequestRepositoryError, RescueRequestView, UpdateRescueRequest,
    UserRepository,
};
use crate::domain::{
    Actor, CounterAdjustment, CounterDelta, Error, NewNotification, NewRescueRequest,
    Notification, RescueRequest, RescueRequestId, RescueStatus, Role, UserId, UserSummary,
    authorize_delete, authorize_update, creation_deltas, creation_notification,
    transition_deltas, transition_notification, validate_transition,
};

const NOT_FOUND: &str = "Rescue request not found";

/// Lifecycle service implementing the rescue request driving ports.
#[derive(Clone)]
pub struct RescueRequestService<R, U, C, N> {
    requests: Arc<R>,
    users: Arc<U>,
    counters: Arc<C>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, U, C, N> RescueRequestService<R, U, C, N> {
    /// Wire the service to its repositories, the counter store, the notification sink and a clock.
    pub fn new(
        requests: Arc<R>,
        users: Arc<U>,
        counters: Arc<C>,
        notifications: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            requests,
            users,
            counters,
            notifications,
            clock,
        }
    }
}

pub(crate) fn map_request_error(error: RescueRequestRepositoryError) -> Error {
    match error {
        RescueRequestRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("rescue request repository unavailable: {message}"))
        }
        RescueRequestRepositoryError::Query { message } => {
            Error::internal(format!("rescue request repository error: {message}"))
        }
    }
}

impl<R, U, C, N> RescueRequestService<R, U, C, N>
where
    R: RescueRequestRepository,
    U: UserRepository,
    C: CounterStore,
    N: NotificationRepository,
{
    async fn load(&self, id: &RescueRequestId) -> Result<RescueRequest, Error> {
        self.requests
            .find_by_id(id)
            .await
            .map_err(map_request_error)?
            .ok_or_else(|| Error::not_found(NOT_FOUND))
    }

    /// The named assignee must be an existing, active volunteer.
    async fn check_assignee(&self, volunteer: &UserId) -> Result<(), Error> {
        let user = self
            .users
            .find_by_id(volunteer)
            .await
            .map_err(map_user_error)?;
        match user {
            Some(user) if user.role() == Role::Volunteer && user.is_active() => Ok(()),
            Some(_) => Err(Error::invalid_request(
                "assignedTo must reference an active volunteer",
            )),
            None => Err(Error::invalid_request("assignedTo references an unknown user")),
        }
    }

    async fn apply_deltas(&self, request: RescueRequestId, deltas: Vec<CounterDelta>) {
        for delta in deltas {
            match self.counters.adjust(&delta).await {
                Ok(CounterAdjustment::Applied) => debug!(
                    request_id = %request,
                    user_id = %delta.user_id,
                    counter = %delta.counter,
                    delta = delta.delta,
                    "statistics counter adjusted"
                ),
                Ok(CounterAdjustment::Clamped) => warn!(
                    request_id = %request,
                    user_id = %delta.user_id,
                    counter = %delta.counter,
                    delta = delta.delta,
                    "statistics counter would go negative; clamped to zero"
                ),
                Ok(CounterAdjustment::UserMissing) => warn!(
                    request_id = %request,
                    user_id = %delta.user_id,
                    counter = %delta.counter,
                    "statistics counter owner no longer exists"
                ),
                Err(CounterStoreError::Connection { message } | CounterStoreError::Query { message }) => {
                    warn!(
                        request_id = %request,
                        user_id = %delta.user_id,
                        counter = %delta.counter,
                        delta = delta.delta,
                        error = %message,
                        "failed to apply statistics counter"
                    );
                }
            }
        }
    }

    async fn notify(&self, notification: Option<NewNotification>) {
        let Some(input) = notification else {
            return;
        };
        let kind = input.kind.clone();
        let notification = match Notification::new(input, self.clock.utc()) {
            Ok(notification) => notification,
            Err(err) => {
                warn!(kind = %kind, error = %err, "lifecycle notification is invalid");
                return;
            }
        };
        if let Err(
            NotificationRepositoryError::Connection { message }
            | NotificationRepositoryError::Query { message },
        ) = self.notifications.insert(&notification).await
        {
            warn!(kind = %kind, error = %message, "failed to store lifecycle notification");
        }
    }

    /// Resolve informer and assignee summaries for a batch of requests with
    /// one repository call.
    async fn resolve(&self, requests: Vec<RescueRequest>) -> Result<Vec<RescueRequestView>, Error> {
        let mut ids: Vec<UserId> = requests
            .iter()
            .flat_map(|request| {
                std::iter::once(request.informer().clone()).chain(request.assigned_to().cloned())
            })
            .collect();
        ids.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        ids.dedup();

        let people: HashMap<UserId, UserSummary> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.users
                .find_by_ids(&ids)
                .await
                .map_err(map_user_error)?
                .iter()
                .map(|user| (user.id().clone(), UserSummary::from(user)))
                .collect()
        };

        Ok(requests
            .into_iter()
            .map(|request| RescueRequestView {
                informer: people.get(request.informer()).cloned(),
                assigned_to: request
                    .assigned_to()
                    .and_then(|id| people.get(id))
                    .cloned(),
                request,
            })
            .collect())
    }

    async fn resolve_one(&self, request: RescueRequest) -> Result<RescueRequestView, Error> {
        self.resolve(vec![request])
            .await?
            .pop()
            .ok_or_else(|| Error::internal("resolved view went missing"))
    }
}

#[async_trait]
impl<R, U, C, N> RescueRequestCommand for RescueRequestService<R, U, C, N>
where
    R: RescueRequestRepository,
    U: UserRepository,
    C: CounterStore,
    N: NotificationRepository,
{
    async fn create(&self, request: CreateRescueRequest) -> Result<RescueRequestView, Error> {
        let CreateRescueRequest {
            actor,
            description,
            location,
            image_url,
            coordinates,
        } = request;

        let created = RescueRequest::create(
            NewRescueRequest {
                informer: actor.id,
                description,
                location,
                image_url,
                coordinates,
            },
            self.clock.utc(),
        )?;
        self.requests
            .insert(&created)
            .await
            .map_err(map_request_error)?;
        info!(request_id = %created.id(), informer = %created.informer(), "rescue request created");

        self.apply_deltas(created.id(), creation_deltas(created.informer()))
            .await;
        self.notify(Some(creation_notification(&created))).await;

        self.resolve_one(created).await
    }

    async fn update(&self, request: UpdateRescueRequest) -> Result<RescueRequestView, Error> {
        let UpdateRescueRequest { actor, id, changes } = request;

        let current = self.load(&id).await?;
        let previous = current.status();
        let next = changes.status_change(previous);

        if let Some(next) = next {
            validate_transition(previous, next)?;
        }
        authorize_update(&actor, &current)?;
        if let (Some(RescueStatus::Assigned), Some(volunteer)) = (next, changes.assigned_to.as_ref())
        {
            self.check_assignee(volunteer).await?;
        }

        let updated = current.apply_changes(changes, self.clock.utc())?;
        let saved = self
            .requests
            .save(&updated)
            .await
            .map_err(map_request_error)?;
        if !saved {
            return Err(Error::not_found(NOT_FOUND));
        }

        if let Some(next) = next {
            info!(
                request_id = %id,
                actor = %actor.id,
                from = %previous,
                to = %next,
                "rescue request status changed"
            );
            let deltas =
                transition_deltas(previous, next, updated.informer(), updated.assigned_to());
            self.apply_deltas(id, deltas).await;
            self.notify(transition_notification(previous, &updated)).await;
        }

        self.resolve_one(updated).await
    }

    async fn delete(&self, actor: &Actor, id: &RescueRequestId) -> Result<(), Error> {
        let current = self.load(id).await?;
        authorize_delete(actor, &current)?;

        let deleted = self
            .requests
            .delete(id)
            .await
            .map_err(map_request_error)?;
        if !deleted {
            return Err(Error::not_found(NOT_FOUND));
        }
        info!(request_id = %id, actor = %actor.id, "rescue request deleted");
        Ok(())
    }
}

#[async_trait]
impl<R, U, C, N> RescueRequestQuery for RescueRequestService<R, U, C, N>
where
    R: RescueRequestRepository,
    U: UserRepository,
    C: CounterStore,
    N: NotificationRepository,
{
    async fn list(&self, filter: &RescueRequestFilter) -> Result<Vec<RescueRequestView>, Error> {
        let requests = self
            .requests
            .list(filter)
            .await
            .map_err(map_request_error)?;
        self.resolve(requests).await
    }

    async fn get(&self, id: &RescueRequestId) -> Result<RescueRequestView, Error> {
        let request = self.load(id).await?;
        self.resolve_one(request).await
    }
}

#[cfg(test)]
#[path = "rescue_request_service_tests.rs"]
mod tests;
