//! Driving port for rescue request mutations.
//!
//! Every mutation goes through the lifecycle service behind this port; there
//! is no other write path for rescue requests or the statistics counters
//! they drive.

use async_trait::async_trait;

use crate::domain::{
    Actor, Coordinates, Error, RescueRequest, RescueRequestChanges, RescueRequestId, UserSummary,
};

/// Fields for filing a new request. The informer is always the actor.
#[derive(Debug, Clone)]
pub struct CreateRescueRequest {
    pub actor: Actor,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Partial update of one request.
#[derive(Debug, Clone)]
pub struct UpdateRescueRequest {
    pub actor: Actor,
    pub id: RescueRequestId,
    pub changes: RescueRequestChanges,
}

/// A request with its informer and assignee resolved for display.
///
/// A summary is `None` when the referenced account no longer resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueRequestView {
    pub request: RescueRequest,
    pub informer: Option<UserSummary>,
    pub assigned_to: Option<UserSummary>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RescueRequestCommand: Send + Sync {
    /// File a request in `pending` and credit the informer.
    async fn create(&self, request: CreateRescueRequest) -> Result<RescueRequestView, Error>;

    /// Validate, authorise and apply a partial update.
    ///
    /// # Errors
    ///
    /// `not_found`, `invalid_transition`, `forbidden` or `invalid_request`,
    /// checked in that order.
    async fn update(&self, request: UpdateRescueRequest) -> Result<RescueRequestView, Error>;

    /// Hard-delete a request the actor may delete.
    async fn delete(&self, actor: &Actor, id: &RescueRequestId) -> Result<(), Error>;
}
