//! Statistics read endpoints.
//!
//! ```text
//! GET /api/v1/users/me/statistics
//! GET /api/v1/users/{id}/statistics
//! ```
//!
//! Register [`my_statistics`] before [`user_statistics`] so `me` is not taken
//! for an id.

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::{DerivedStatistics, StatisticsReport};
use crate::domain::{Actor, Role, UserId, UserStatistics};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, RoleSchema, UserStatisticsSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const USER_ID: FieldName = FieldName::new("id");

/// Live counts recomputed from rescue requests. Volunteers receive
/// `rescuedRequests`, `completedRequests` and `inProgressRequests`;
/// informers receive `pendingRequests`, `approvedRequests`,
/// `rejectedRequests` and `totalRequests`.
#[derive(ToSchema)]
#[schema(as = DerivedStatistics, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DerivedStatisticsSchema {
    rescued_requests: Option<u64>,
    completed_requests: Option<u64>,
    in_progress_requests: Option<u64>,
    pending_requests: Option<u64>,
    approved_requests: Option<u64>,
    rejected_requests: Option<u64>,
    total_requests: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsBody {
    pub user_id: String,
    pub name: String,
    #[schema(value_type = RoleSchema)]
    pub role: Role,
    #[schema(value_type = UserStatisticsSchema)]
    pub statistics: UserStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DerivedStatisticsSchema>)]
    pub derived: Option<DerivedStatistics>,
}

impl From<StatisticsReport> for StatisticsBody {
    fn from(report: StatisticsReport) -> Self {
        Self {
            user_id: report.user_id.to_string(),
            name: report.name,
            role: report.role,
            statistics: report.statistics,
            derived: report.derived,
        }
    }
}

async fn report_for(
    state: &HttpState,
    actor: &Actor,
    user_id: &UserId,
) -> ApiResult<web::Json<StatisticsBody>> {
    let report = state.statistics.user_statistics(actor, user_id).await?;
    Ok(web::Json(StatisticsBody::from(report)))
}

/// Statistics for the logged-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/statistics",
    responses(
        (status = 200, description = "Statistics", body = StatisticsBody),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["statistics"],
    operation_id = "getMyStatistics"
)]
#[get("/users/me/statistics")]
pub async fn my_statistics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StatisticsBody>> {
    let actor = state.actor(&session).await?;
    let user_id = actor.id.clone();
    report_for(&state, &actor, &user_id).await
}

/// Statistics for any user. Admins and team leaders only, unless the id is
/// the caller's own.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/statistics",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Statistics", body = StatisticsBody),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["statistics"],
    operation_id = "getUserStatistics"
)]
#[get("/users/{id}/statistics")]
pub async fn user_statistics(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<StatisticsBody>> {
    let actor = state.actor(&session).await?;
    let user_id = parse_id(&path.into_inner(), USER_ID, UserId::from_uuid)?;
    report_for(&state, &actor, &user_id).await
}
