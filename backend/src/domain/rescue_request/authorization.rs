//! Who may mutate a rescue request.
//!
//! Decisions are taken against the request as stored, before any change is
//! merged.

use super::{RescueRequest, RescueStatus};
use crate::domain::{Error, Role, UserId};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    fn owns_pending(&self, request: &RescueRequest) -> bool {
        request.informer() == &self.id && request.status() == RescueStatus::Pending
    }
}

/// Update rules:
/// - admin, team leader, request checker: always;
/// - volunteer: only when assigned to the request;
/// - informer: only their own request while still `pending`;
/// - anyone else: never.
pub fn may_update(actor: &Actor, request: &RescueRequest) -> bool {
    match actor.role {
        Role::Admin | Role::TeamLeader | Role::RequestChecker => true,
        Role::Volunteer => request.assigned_to() == Some(&actor.id),
        Role::Informer => actor.owns_pending(request),
        Role::Receptionist => false,
    }
}

/// Delete rules: admin and request checker always; the owning informer
/// while `pending`; nobody else.
pub fn may_delete(actor: &Actor, request: &RescueRequest) -> bool {
    match actor.role {
        Role::Admin | Role::RequestChecker => true,
        Role::Informer => actor.owns_pending(request),
        Role::TeamLeader | Role::Volunteer | Role::Receptionist => false,
    }
}

/// The attempted operation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Update,
    Delete,
}

impl std::fmt::Display for RequestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// The actor is not allowed to perform `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Not authorized to {action} this rescue request")]
pub struct AuthorizationError {
    pub action: RequestAction,
}

/// [`may_update`] as a `Result`, ready for `?` in the service layer.
pub fn authorize_update(actor: &Actor, request: &RescueRequest) -> Result<(), AuthorizationError> {
    if may_update(actor, request) {
        Ok(())
    } else {
        Err(AuthorizationError {
            action: RequestAction::Update,
        })
    }
}

/// [`may_delete`] as a `Result`.
pub fn authorize_delete(actor: &Actor, request: &RescueRequest) -> Result<(), AuthorizationError> {
    if may_delete(actor, request) {
        Ok(())
    } else {
        Err(AuthorizationError {
            action: RequestAction::Delete,
        })
    }
}

impl From<AuthorizationError> for Error {
    fn from(value: AuthorizationError) -> Self {
        Error::forbidden(value.to_string())
    }
}
