//! Domain primitives, aggregates and services.
//!
//! Purpose: Define the strongly typed entities of the rescue case lifecycle,
//! the pure evaluators that guard it, and the services implementing the
//! driving ports. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Role (from `user`): accounts and their roles.
//! - RescueRequest, RescueStatus (from `rescue_request`): the lifecycle
//!   aggregate, its transition graph and authorization rules.
//! - UserStatistics, CounterDelta (from `statistics`): counter bookkeeping.
//! - Notification (from `notification`): user or role addressed messages.

pub mod auth;
pub mod error;
pub mod notification;
pub mod ports;
pub mod rescue_request;
pub mod statistics;
pub mod trace_id;
pub mod user;

mod account_service;
mod notification_service;
mod rescue_request_service;
mod statistics_service;

#[cfg(test)]
pub(crate) mod service_test_support;

pub use self::account_service::AccountService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN_LEN, Password, PasswordHash,
    PasswordHashError, PasswordTooShort,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::notification::{
    Audience, NEW_RESCUE_APPROVED, NEW_RESCUE_REQUEST, NewNotification, Notification,
    NotificationId, NotificationSnapshot, NotificationTarget, NotificationValidationError,
    RESCUE_ASSIGNED, RESCUE_COMPLETED, RESCUE_REJECTED, creation_notification,
    transition_notification,
};
pub use self::notification_service::NotificationService;
pub use self::rescue_request::authorization::{
    Actor, AuthorizationError, RequestAction, authorize_delete, authorize_update, may_delete,
    may_update,
};
pub use self::rescue_request::changes::{RescueRequestChanges, UpdatesChange};
pub use self::rescue_request::transition::{
    TransitionError, allowed_targets, is_valid_transition, validate_transition,
};
pub use self::rescue_request::{
    CREATED_UPDATE_MESSAGE, Coordinates, NewRescueRequest, RescueRequest, RescueRequestId,
    RescueRequestSnapshot, RescueRequestValidationError, RescueStatus, UnknownStatus, UpdateEntry,
};
pub use self::rescue_request_service::RescueRequestService;
pub use self::statistics::{
    CounterAdjustment, CounterDelta, CounterKey, UserStatistics, creation_deltas,
    transition_deltas,
};
pub use self::statistics_service::StatisticsService;
pub use self::trace_id::TraceId;
pub use self::user::{
    Area, EmailAddress, ProfileChanges, Role, User, UserDraft, UserId, UserSummary,
    UserValidationError, Username, area_for_role,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use pawresq::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
