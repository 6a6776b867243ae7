//! Port for atomic statistics counter adjustments.

use async_trait::async_trait;

use crate::domain::{CounterAdjustment, CounterDelta};

use super::define_port_error;

define_port_error! {
    /// Errors raised while adjusting counters.
    pub enum CounterStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "counter store connection failed: {message}",
        /// The adjustment statement failed.
        Query { message: String } => "counter store query failed: {message}",
    }
}

/// Applies one counter delta as a single atomic operation.
///
/// Implementations must never read, modify and write back the whole user:
/// concurrent transitions on the same user must not lose increments. A
/// decrement that would go negative sets the counter to zero and reports
/// [`CounterAdjustment::Clamped`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn adjust(&self, delta: &CounterDelta) -> Result<CounterAdjustment, CounterStoreError>;
}
