//! Driving port for the read-only statistics surface.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Actor, Error, Role, UserId, UserStatistics};

/// Counts recomputed from current rescue request state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DerivedStatistics {
    #[serde(rename_all = "camelCase")]
    Volunteer {
        rescued_requests: u64,
        completed_requests: u64,
        in_progress_requests: u64,
    },
    #[serde(rename_all = "camelCase")]
    Informer {
        pending_requests: u64,
        approved_requests: u64,
        rejected_requests: u64,
        total_requests: u64,
    },
}

/// Statistics for one user after the per-counter read policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsReport {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
    pub statistics: UserStatistics,
    pub derived: Option<DerivedStatistics>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatisticsQuery: Send + Sync {
    /// Report for `user_id`. Anyone may read their own; admins and team
    /// leaders may read anyone's.
    async fn user_statistics(
        &self,
        actor: &Actor,
        user_id: &UserId,
    ) -> Result<StatisticsReport, Error>;
}
