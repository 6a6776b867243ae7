//! Port for rescue request persistence.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{RescueRequest, RescueRequestId, RescueStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rescue request repository adapters.
    pub enum RescueRequestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "rescue request repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "rescue request repository query failed: {message}",
    }
}

/// Exact-match filters, AND-combined. An empty `statuses` list matches any
/// status; several statuses match any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescueRequestFilter {
    pub statuses: Vec<RescueStatus>,
    pub informer: Option<UserId>,
    pub assigned_to: Option<UserId>,
}

impl RescueRequestFilter {
    pub fn matches(&self, request: &RescueRequest) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&request.status()))
            && self
                .informer
                .as_ref()
                .is_none_or(|informer| request.informer() == informer)
            && self
                .assigned_to
                .as_ref()
                .is_none_or(|assignee| request.assigned_to() == Some(assignee))
    }
}

/// Whose requests to count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCountScope {
    /// Requests filed by this informer.
    Informer(UserId),
    /// Requests currently assigned to this volunteer.
    Assignee(UserId),
}

/// Number of requests per status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts(HashMap<RescueStatus, u64>);

impl StatusCounts {
    pub fn get(&self, status: RescueStatus) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    /// Sum of the counts for `statuses`.
    pub fn sum(&self, statuses: &[RescueStatus]) -> u64 {
        statuses.iter().map(|status| self.get(*status)).sum()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn record(&mut self, status: RescueStatus, count: u64) {
        *self.0.entry(status).or_insert(0) += count;
    }
}

/// Rescue request storage. Every call is atomic for the one entity it
/// touches; there are no cross-entity transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescueRequestRepository: Send + Sync {
    async fn insert(&self, request: &RescueRequest) -> Result<(), RescueRequestRepositoryError>;

    /// Overwrite a stored request. Returns `false` when it no longer exists.
    async fn save(&self, request: &RescueRequest) -> Result<bool, RescueRequestRepositoryError>;

    async fn find_by_id(
        &self,
        id: &RescueRequestId,
    ) -> Result<Option<RescueRequest>, RescueRequestRepositoryError>;

    /// Matching requests, newest first.
    async fn list(
        &self,
        filter: &RescueRequestFilter,
    ) -> Result<Vec<RescueRequest>, RescueRequestRepositoryError>;

    /// Remove a request. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &RescueRequestId) -> Result<bool, RescueRequestRepositoryError>;

    /// Live per-status counts for the read-side statistics backstop.
    async fn status_counts(
        &self,
        scope: &StatusCountScope,
    ) -> Result<StatusCounts, RescueRequestRepositoryError>;
}
