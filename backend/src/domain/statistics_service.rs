//! Read side of the per-user statistics.
//!
//! Stored counters are maintained incrementally by the lifecycle service and
//! may drift when a best-effort adjustment fails. Reads therefore merge them
//! with counts recomputed from current rescue request state, following an
//! explicit per-counter policy:
//!
//! | Role      | Counter          | Source                                      |
//! |-----------|------------------|---------------------------------------------|
//! | volunteer | `rescuesRescued` | stored, or live `rescued` count when zero   |
//! | volunteer | `saveCount`      | stored, or live `completed` count when zero |
//! | informer  | `helpCount`      | stored, or live total when zero             |
//! | any       | everything else  | stored                                      |

use std::sync::Arc;

use async_trait::async_trait;

use super::account_service::map_user_error;
use super::rescue_request_service::map_request_error;
use crate::domain::ports::{
    DerivedStatistics, RescueRequestRepository, StatisticsQuery, StatisticsReport,
    StatusCountScope, StatusCounts, UserRepository,
};
use crate::domain::{Actor, Error, RescueStatus, Role, UserId, UserStatistics};

/// Statuses counted as approved for an informer: approved or further along.
const APPROVED_OR_LATER: [RescueStatus; 5] = [
    RescueStatus::Approved,
    RescueStatus::Assigned,
    RescueStatus::InProgress,
    RescueStatus::Rescued,
    RescueStatus::Completed,
];

const ACTIVE_ASSIGNMENT: [RescueStatus; 2] = [RescueStatus::Assigned, RescueStatus::InProgress];

#[derive(Clone)]
pub struct StatisticsService<U, R> {
    users: Arc<U>,
    requests: Arc<R>,
}

impl<U, R> StatisticsService<U, R> {
    /// Build the report service over the user and rescue request repositories.
    pub fn new(users: Arc<U>, requests: Arc<R>) -> Self {
        Self { users, requests }
    }
}

fn fallback(stored: u64, derived: u64) -> u64 {
    if stored == 0 { derived } else { stored }
}

fn volunteer_view(
    mut statistics: UserStatistics,
    counts: &StatusCounts,
) -> (UserStatistics, DerivedStatistics) {
    let rescued = counts.get(RescueStatus::Rescued);
    let completed = counts.get(RescueStatus::Completed);
    statistics.rescues_rescued = fallback(statistics.rescues_rescued, rescued);
    statistics.save_count = fallback(statistics.save_count, completed);
    (
        statistics,
        DerivedStatistics::Volunteer {
            rescued_requests: rescued,
            completed_requests: completed,
            in_progress_requests: counts.sum(&ACTIVE_ASSIGNMENT),
        },
    )
}

fn informer_view(
    mut statistics: UserStatistics,
    counts: &StatusCounts,
) -> (UserStatistics, DerivedStatistics) {
    let total = counts.total();
    statistics.help_count = fallback(statistics.help_count, total);
    (
        statistics,
        DerivedStatistics::Informer {
            pending_requests: counts.get(RescueStatus::Pending),
            approved_requests: counts.sum(&APPROVED_OR_LATER),
            rejected_requests: counts.get(RescueStatus::Rejected),
            total_requests: total,
        },
    )
}

#[async_trait]
impl<U, R> StatisticsQuery for StatisticsService<U, R>
where
    U: UserRepository,
    R: RescueRequestRepository,
{
    async fn user_statistics(
        &self,
        actor: &Actor,
        user_id: &UserId,
    ) -> Result<StatisticsReport, Error> {
        if &actor.id != user_id && !actor.role.can_view_users() {
            return Err(Error::forbidden(
                "Not authorized to view this user's statistics",
            ));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let scope = match user.role() {
            Role::Volunteer => Some(StatusCountScope::Assignee(user_id.clone())),
            Role::Informer => Some(StatusCountScope::Informer(user_id.clone())),
            _ => None,
        };
        let stored = *user.statistics();
        let (statistics, derived) = match scope {
            Some(scope) => {
                let counts = self
                    .requests
                    .status_counts(&scope)
                    .await
                    .map_err(map_request_error)?;
                let (statistics, derived) = match scope {
                    StatusCountScope::Assignee(_) => volunteer_view(stored, &counts),
                    StatusCountScope::Informer(_) => informer_view(stored, &counts),
                };
                (statistics, Some(derived))
            }
            None => (stored, None),
        };

        Ok(StatisticsReport {
            user_id: user_id.clone(),
            name: user.name().to_owned(),
            role: user.role(),
            statistics,
            derived,
        })
    }
}
