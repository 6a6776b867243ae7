//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`CounterStore`]) are implemented by the
//! outbound adapters; driving ports (`*Command`, `*Query`,
//! [`LoginService`]) are implemented by the domain services and consumed by
//! the HTTP handlers.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod counter_store;
mod login_service;
mod notification_command;
mod notification_query;
mod notification_repository;
mod rescue_request_command;
mod rescue_request_query;
mod rescue_request_repository;
mod statistics_query;
mod user_repository;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::{AccountCommand, ProfileEdit, Registration};
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_query::AccountQuery;
#[cfg(test)]
pub use counter_store::MockCounterStore;
pub use counter_store::{CounterStore, CounterStoreError};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
#[cfg(test)]
pub use notification_query::MockNotificationQuery;
pub use notification_query::{NotificationQuery, NotificationView, RescueRequestDigest};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use rescue_request_command::MockRescueRequestCommand;
pub use rescue_request_command::{
    CreateRescueRequest, RescueRequestCommand, RescueRequestView, UpdateRescueRequest,
};
#[cfg(test)]
pub use rescue_request_query::MockRescueRequestQuery;
pub use rescue_request_query::RescueRequestQuery;
#[cfg(test)]
pub use rescue_request_repository::MockRescueRequestRepository;
pub use rescue_request_repository::{
    RescueRequestFilter, RescueRequestRepository, RescueRequestRepositoryError, StatusCountScope,
    StatusCounts,
};
#[cfg(test)]
pub use statistics_query::MockStatisticsQuery;
pub use statistics_query::{DerivedStatistics, StatisticsQuery, StatisticsReport};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserFilter, UserPersistenceError, UserRepository};
