//! Driving port for rescue request reads.

use async_trait::async_trait;

use crate::domain::{Error, RescueRequestId};

use super::{RescueRequestFilter, RescueRequestView};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescueRequestQuery: Send + Sync {
    /// Matching requests, newest first, with people resolved.
    async fn list(&self, filter: &RescueRequestFilter) -> Result<Vec<RescueRequestView>, Error>;

    /// One request, or `not_found`.
    async fn get(&self, id: &RescueRequestId) -> Result<RescueRequestView, Error>;
}
