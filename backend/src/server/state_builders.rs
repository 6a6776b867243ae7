//! Builders wiring repositories into the services behind [`HttpState`].

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use crate::domain::ports::{
    CounterStore, NotificationRepository, RescueRequestRepository, UserRepository,
};
use crate::domain::{AccountService, NotificationService, RescueRequestService, StatisticsService};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{
    InMemoryNotificationRepository, InMemoryRescueRequestRepository, InMemoryUserRepository,
};
use crate::outbound::persistence::{
    DbPool, DieselNotificationRepository, DieselRescueRequestRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Wire one set of repositories into every driving port.
///
/// The user repository doubles as the counter store so statistics land on
/// the same rows the accounts service reads.
pub fn http_state_from_repositories<U, R, N>(
    users: Arc<U>,
    requests: Arc<R>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    U: UserRepository + CounterStore + 'static,
    R: RescueRequestRepository + 'static,
    N: NotificationRepository + 'static,
{
    let accounts = Arc::new(AccountService::new(users.clone(), clock.clone()));
    let lifecycle = Arc::new(RescueRequestService::new(
        requests.clone(),
        users.clone(),
        users.clone(),
        notifications.clone(),
        clock.clone(),
    ));
    let statistics = Arc::new(StatisticsService::new(users, requests.clone()));
    let inbox = Arc::new(NotificationService::new(notifications, requests, clock));

    HttpState {
        login: accounts.clone(),
        accounts: accounts.clone(),
        accounts_query: accounts,
        rescue_requests: lifecycle.clone(),
        rescue_requests_query: lifecycle,
        statistics,
        notifications: inbox.clone(),
        notifications_query: inbox,
    }
}

/// State backed by the in-memory adapters, starting empty.
pub fn in_memory_http_state() -> HttpState {
    http_state_from_repositories(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryRescueRequestRepository::new()),
        Arc::new(InMemoryNotificationRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn diesel_http_state(pool: &DbPool) -> HttpState {
    http_state_from_repositories(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselRescueRequestRepository::new(pool.clone())),
        Arc::new(DieselNotificationRepository::new(pool.clone())),
        Arc::new(DefaultClock),
    )
}

/// Build the shared HTTP state, falling back to memory without a pool.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => diesel_http_state(pool),
        None => {
            warn!("no database configured; state is kept in memory and lost on shutdown");
            in_memory_http_state()
        }
    };
    web::Data::new(state)
}
