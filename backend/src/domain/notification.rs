//! Notifications addressed to a user, a role, or both.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RescueRequest, RescueRequestId, RescueStatus, Role, UserId};

/// Notification type emitted when a request is filed.
pub const NEW_RESCUE_REQUEST: &str = "NEW_RESCUE_REQUEST";
/// Notification type emitted when a checker approves a request.
pub const NEW_RESCUE_APPROVED: &str = "NEW_RESCUE_APPROVED";
/// Notification type emitted when a request is rejected.
pub const RESCUE_REJECTED: &str = "RESCUE_REJECTED";
/// Notification type emitted when a volunteer is assigned.
pub const RESCUE_ASSIGNED: &str = "RESCUE_ASSIGNED";
/// Notification type emitted when a rescue is completed.
pub const RESCUE_COMPLETED: &str = "RESCUE_COMPLETED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyKind,
    EmptyContent,
    MissingTarget,
}

impl fmt::Display for NotificationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKind => write!(f, "type must not be empty"),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::MissingTarget => write!(f, "either targetId or targetRole is required"),
        }
    }
}

impl std::error::Error for NotificationValidationError {}

/// Who a notification is for. At least one of user or role is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    user: Option<UserId>,
    role: Option<Role>,
}

impl NotificationTarget {
    pub fn new(user: Option<UserId>, role: Option<Role>) -> Result<Self, NotificationValidationError> {
        if user.is_none() && role.is_none() {
            return Err(NotificationValidationError::MissingTarget);
        }
        Ok(Self { user, role })
    }

    pub fn user(id: UserId) -> Self {
        Self {
            user: Some(id),
            role: None,
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            user: None,
            role: Some(role),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn target_role(&self) -> Option<Role> {
        self.role
    }

    /// Whether a reader with this identity and role should see it.
    pub fn addresses(&self, audience: &Audience) -> bool {
        self.user.as_ref() == Some(&audience.user_id) || self.role == Some(audience.role)
    }
}

/// The reader a notification query is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audience {
    pub user_id: UserId,
    pub role: Role,
}

/// Input for [`Notification::new`].
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub target: NotificationTarget,
    pub content: String,
    pub rescue_request_id: Option<RescueRequestId>,
}

/// Stored notification state, used by adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSnapshot {
    pub id: NotificationId,
    pub kind: String,
    pub target: NotificationTarget,
    pub content: String,
    pub rescue_request_id: Option<RescueRequestId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    id: NotificationId,
    kind: String,
    target: NotificationTarget,
    content: String,
    rescue_request_id: Option<RescueRequestId>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(input: NewNotification, now: DateTime<Utc>) -> Result<Self, NotificationValidationError> {
        let NewNotification {
            kind,
            target,
            content,
            rescue_request_id,
        } = input;
        Self::restore(NotificationSnapshot {
            id: NotificationId::random(),
            kind,
            target,
            content,
            rescue_request_id,
            is_read: false,
            created_at: now,
        })
    }

    pub fn restore(snapshot: NotificationSnapshot) -> Result<Self, NotificationValidationError> {
        let NotificationSnapshot {
            id,
            kind,
            target,
            content,
            rescue_request_id,
            is_read,
            created_at,
        } = snapshot;

        let kind = kind.trim();
        if kind.is_empty() {
            return Err(NotificationValidationError::EmptyKind);
        }
        if content.trim().is_empty() {
            return Err(NotificationValidationError::EmptyContent);
        }
        Ok(Self {
            id,
            kind: kind.to_owned(),
            target,
            content,
            rescue_request_id,
            is_read,
            created_at,
        })
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn kind(&self) -> &str {
        self.kind.as_str()
    }

    pub fn target(&self) -> &NotificationTarget {
        &self.target
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn rescue_request_id(&self) -> Option<RescueRequestId> {
        self.rescue_request_id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// Notification emitted when `request` is filed: every request checker
/// should review it.
pub fn creation_notification(request: &RescueRequest) -> NewNotification {
    NewNotification {
        kind: NEW_RESCUE_REQUEST.to_owned(),
        target: NotificationTarget::role(Role::RequestChecker),
        content: format!("New rescue request at {}", request.location()),
        rescue_request_id: Some(request.id()),
    }
}

/// Notification emitted when `request` has just moved from `previous` to
/// its current status, if that move is announced.
pub fn transition_notification(
    previous: RescueStatus,
    request: &RescueRequest,
) -> Option<NewNotification> {
    use RescueStatus as S;

    let location = request.location();
    let (kind, target, content) = match (previous, request.status()) {
        (S::Pending, S::Approved) => (
            NEW_RESCUE_APPROVED,
            NotificationTarget::role(Role::TeamLeader),
            format!("Rescue request at {location} is approved and needs a volunteer"),
        ),
        (S::Pending | S::Approved, S::Rejected) => (
            RESCUE_REJECTED,
            NotificationTarget::user(request.informer().clone()),
            format!("Your rescue request at {location} was rejected"),
        ),
        (from, S::Assigned) if from != S::Assigned => (
            RESCUE_ASSIGNED,
            NotificationTarget::user(request.assigned_to()?.clone()),
            format!("You have been assigned a rescue at {location}"),
        ),
        (from, S::Completed) if from != S::Completed => (
            RESCUE_COMPLETED,
            NotificationTarget::user(request.informer().clone()),
            format!("Your rescue request at {location} has been completed"),
        ),
        _ => return None,
    };

    Some(NewNotification {
        kind: kind.to_owned(),
        target,
        content,
        rescue_request_id: Some(request.id()),
    })
}
