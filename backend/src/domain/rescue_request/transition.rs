//! The fixed status graph of a rescue request.
//!
//! | From        | To                               |
//! |-------------|----------------------------------|
//! | pending     | approved, rejected               |
//! | approved    | assigned, rejected               |
//! | assigned    | rescued, in-progress, cancelled  |
//! | rescued     | completed                        |
//! | in-progress | rescued, completed, cancelled    |
//!
//! `rejected`, `completed` and `cancelled` are terminal.

use serde_json::json;

use super::RescueStatus;
use crate::domain::Error;

/// Statuses reachable from `from` in one step.
pub const fn allowed_targets(from: RescueStatus) -> &'static [RescueStatus] {
    use RescueStatus as S;
    match from {
        S::Pending => &[S::Approved, S::Rejected],
        S::Approved => &[S::Assigned, S::Rejected],
        S::Assigned => &[S::Rescued, S::InProgress, S::Cancelled],
        S::Rescued => &[S::Completed],
        S::InProgress => &[S::Rescued, S::Completed, S::Cancelled],
        S::Rejected | S::Completed | S::Cancelled => &[],
    }
}

/// Whether `current → proposed` is an edge of the graph.
///
/// Self-loops are not edges; callers skip validation when the status is
/// unchanged.
///
/// # Examples
/// ```
/// use pawresq::domain::{RescueStatus, is_valid_transition};
///
/// assert!(is_valid_transition(RescueStatus::Pending, RescueStatus::Approved));
/// assert!(!is_valid_transition(RescueStatus::Pending, RescueStatus::Completed));
/// ```
pub fn is_valid_transition(current: RescueStatus, proposed: RescueStatus) -> bool {
    allowed_targets(current).contains(&proposed)
}

/// A status move outside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: RescueStatus,
    pub to: RescueStatus,
}

/// Validate a proposed move, returning both states on failure.
pub fn validate_transition(
    current: RescueStatus,
    proposed: RescueStatus,
) -> Result<(), TransitionError> {
    if is_valid_transition(current, proposed) {
        Ok(())
    } else {
        Err(TransitionError {
            from: current,
            to: proposed,
        })
    }
}

impl From<TransitionError> for Error {
    fn from(value: TransitionError) -> Self {
        Error::invalid_transition(value.to_string()).with_details(json!({
            "from": value.from.as_str(),
            "to": value.to.as_str(),
        }))
    }
}
