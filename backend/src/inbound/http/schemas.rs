//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their wire shape and exist only for documentation;
//! DTO fields point at them with `#[schema(value_type = ...)]`.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested status change is not an edge of the lifecycle graph.
    #[schema(rename = "invalid_transition")]
    InvalidTransition,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// Username or email already taken.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store could not be reached.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_transition")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Invalid status transition from pending to completed")]
    message: String,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details, e.g. `{"from": "pending", "to": "completed"}`.
    details: Option<serde_json::Value>,
}

/// Rescue request lifecycle status.
#[derive(ToSchema)]
#[schema(as = RescueStatus)]
pub enum RescueStatusSchema {
    #[schema(rename = "pending")]
    Pending,
    #[schema(rename = "approved")]
    Approved,
    #[schema(rename = "rejected")]
    Rejected,
    #[schema(rename = "assigned")]
    Assigned,
    #[schema(rename = "rescued")]
    Rescued,
    #[schema(rename = "in-progress")]
    InProgress,
    #[schema(rename = "completed")]
    Completed,
    #[schema(rename = "cancelled")]
    Cancelled,
}

/// Account role.
#[derive(ToSchema)]
#[schema(as = Role)]
pub enum RoleSchema {
    #[schema(rename = "volunteer")]
    Volunteer,
    #[schema(rename = "teamLeader")]
    TeamLeader,
    #[schema(rename = "requestChecker")]
    RequestChecker,
    #[schema(rename = "receptionist")]
    Receptionist,
    #[schema(rename = "informer")]
    Informer,
    #[schema(rename = "admin")]
    Admin,
}

/// OpenAPI schema for [`crate::domain::UserStatistics`].
#[derive(ToSchema)]
#[schema(as = UserStatistics, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UserStatisticsSchema {
    rescues_completed: u64,
    rescues_in_progress: u64,
    rescues_rescued: u64,
    save_count: u64,
    help_count: u64,
    requests_submitted: u64,
    requests_approved: u64,
    requests_rejected: u64,
}
