//! Per-user statistics counters and the deltas lifecycle events produce.
//!
//! Counters are only ever moved by [`creation_deltas`] and
//! [`transition_deltas`]; adapters apply each delta as a single atomic
//! increment (see `ports::CounterStore`). The functions here are pure so the
//! bookkeeping table can be tested without storage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::domain::rescue_request::RescueStatus;

/// One of the eight fixed statistics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKey {
    RescuesCompleted,
    RescuesInProgress,
    RescuesRescued,
    SaveCount,
    HelpCount,
    RequestsSubmitted,
    RequestsApproved,
    RequestsRejected,
}

impl CounterKey {
    pub const ALL: [CounterKey; 8] = [
        CounterKey::RescuesCompleted,
        CounterKey::RescuesInProgress,
        CounterKey::RescuesRescued,
        CounterKey::SaveCount,
        CounterKey::HelpCount,
        CounterKey::RequestsSubmitted,
        CounterKey::RequestsApproved,
        CounterKey::RequestsRejected,
    ];

    /// Wire name, as used in JSON payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RescuesCompleted => "rescuesCompleted",
            Self::RescuesInProgress => "rescuesInProgress",
            Self::RescuesRescued => "rescuesRescued",
            Self::SaveCount => "saveCount",
            Self::HelpCount => "helpCount",
            Self::RequestsSubmitted => "requestsSubmitted",
            Self::RequestsApproved => "requestsApproved",
            Self::RequestsRejected => "requestsRejected",
        }
    }

    /// Storage column name. Closed set; safe to splice into SQL.
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::RescuesCompleted => "rescues_completed",
            Self::RescuesInProgress => "rescues_in_progress",
            Self::RescuesRescued => "rescues_rescued",
            Self::SaveCount => "save_count",
            Self::HelpCount => "help_count",
            Self::RequestsSubmitted => "requests_submitted",
            Self::RequestsApproved => "requests_approved",
            Self::RequestsRejected => "requests_rejected",
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a user's counters.
///
/// Missing keys deserialise as zero, which repairs legacy records lazily.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStatistics {
    pub rescues_completed: u64,
    pub rescues_in_progress: u64,
    pub rescues_rescued: u64,
    pub save_count: u64,
    pub help_count: u64,
    pub requests_submitted: u64,
    pub requests_approved: u64,
    pub requests_rejected: u64,
}

impl UserStatistics {
    pub fn get(&self, key: CounterKey) -> u64 {
        match key {
            CounterKey::RescuesCompleted => self.rescues_completed,
            CounterKey::RescuesInProgress => self.rescues_in_progress,
            CounterKey::RescuesRescued => self.rescues_rescued,
            CounterKey::SaveCount => self.save_count,
            CounterKey::HelpCount => self.help_count,
            CounterKey::RequestsSubmitted => self.requests_submitted,
            CounterKey::RequestsApproved => self.requests_approved,
            CounterKey::RequestsRejected => self.requests_rejected,
        }
    }

    pub fn slot_mut(&mut self, key: CounterKey) -> &mut u64 {
        match key {
            CounterKey::RescuesCompleted => &mut self.rescues_completed,
            CounterKey::RescuesInProgress => &mut self.rescues_in_progress,
            CounterKey::RescuesRescued => &mut self.rescues_rescued,
            CounterKey::SaveCount => &mut self.save_count,
            CounterKey::HelpCount => &mut self.help_count,
            CounterKey::RequestsSubmitted => &mut self.requests_submitted,
            CounterKey::RequestsApproved => &mut self.requests_approved,
            CounterKey::RequestsRejected => &mut self.requests_rejected,
        }
    }

    /// Apply a signed delta. Decrements clamp at zero; increments saturate.
    pub fn adjust(&mut self, key: CounterKey, delta: i64) -> CounterAdjustment {
        let slot = self.slot_mut(key);
        if delta >= 0 {
            *slot = slot.saturating_add(delta.unsigned_abs());
            return CounterAdjustment::Applied;
        }
        match slot.checked_sub(delta.unsigned_abs()) {
            Some(value) => {
                *slot = value;
                CounterAdjustment::Applied
            }
            None => {
                *slot = 0;
                CounterAdjustment::Clamped
            }
        }
    }
}

/// Instruction to move one user's counter by `delta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDelta {
    pub user_id: UserId,
    pub counter: CounterKey,
    pub delta: i64,
}

impl CounterDelta {
    fn increment(user_id: &UserId, counter: CounterKey) -> Self {
        Self {
            user_id: user_id.clone(),
            counter,
            delta: 1,
        }
    }

    fn decrement(user_id: &UserId, counter: CounterKey) -> Self {
        Self {
            user_id: user_id.clone(),
            counter,
            delta: -1,
        }
    }
}

/// Outcome of applying a single delta at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAdjustment {
    /// The counter moved by exactly the requested delta.
    Applied,
    /// A decrement would have gone negative; the counter was set to zero.
    Clamped,
    /// No user with the given id exists.
    UserMissing,
}

/// Deltas produced when an informer files a new request.
pub fn creation_deltas(informer: &UserId) -> Vec<CounterDelta> {
    vec![
        CounterDelta::increment(informer, CounterKey::RequestsSubmitted),
        CounterDelta::increment(informer, CounterKey::HelpCount),
    ]
}

/// Deltas produced by a status change.
///
/// `assigned_to` is the assignee after the change. Returns nothing when the
/// status does not change. Transitions not listed in the bookkeeping table
/// (cancellation, `approved → rejected`) have no counter effect.
///
/// # Examples
/// ```
/// use pawresq::domain::{CounterKey, RescueStatus, UserId, transition_deltas};
///
/// let informer = UserId::random();
/// let deltas = transition_deltas(RescueStatus::Pending, RescueStatus::Rejected, &informer, None);
/// assert_eq!(deltas.len(), 1);
/// assert_eq!(deltas[0].counter, CounterKey::RequestsRejected);
/// ```
pub fn transition_deltas(
    previous: RescueStatus,
    next: RescueStatus,
    informer: &UserId,
    assigned_to: Option<&UserId>,
) -> Vec<CounterDelta> {
    use RescueStatus as S;

    if previous == next {
        return Vec::new();
    }

    match (previous, next, assigned_to) {
        (S::Pending, S::Approved, _) => vec![
            CounterDelta::increment(informer, CounterKey::RequestsApproved),
            CounterDelta::increment(informer, CounterKey::HelpCount),
        ],
        (S::Pending, S::Rejected, _) => {
            vec![CounterDelta::increment(informer, CounterKey::RequestsRejected)]
        }
        (_, S::Assigned, Some(volunteer)) => {
            vec![CounterDelta::increment(volunteer, CounterKey::RescuesInProgress)]
        }
        (S::Assigned | S::InProgress, S::Rescued, Some(volunteer)) => {
            vec![CounterDelta::increment(volunteer, CounterKey::RescuesRescued)]
        }
        (S::Assigned | S::InProgress | S::Rescued, S::Completed, Some(volunteer)) => vec![
            CounterDelta::decrement(volunteer, CounterKey::RescuesInProgress),
            CounterDelta::increment(volunteer, CounterKey::RescuesCompleted),
            CounterDelta::increment(volunteer, CounterKey::SaveCount),
        ],
        (_, S::Completed, Some(volunteer)) => vec![
            CounterDelta::increment(volunteer, CounterKey::RescuesCompleted),
            CounterDelta::increment(volunteer, CounterKey::SaveCount),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "statistics_tests.rs"]
mod tests;
