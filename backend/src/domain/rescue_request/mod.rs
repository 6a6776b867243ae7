//! Rescue requests: the aggregate at the centre of the case lifecycle.
//!
//! A request is filed by an informer, reviewed by a checker, assigned to a
//! volunteer by a team leader, and tracked to completion. Status moves are
//! constrained by [`transition`]; who may touch a request is decided by
//! [`authorization`]; field merging lives in [`changes`].

pub mod authorization;
pub mod changes;
pub mod transition;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, UserId};

/// Message recorded as the first update of every new request.
pub const CREATED_UPDATE_MESSAGE: &str = "Rescue request created";

/// Server-assigned rescue request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RescueRequestId(Uuid);

impl RescueRequestId {
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

impl fmt::Display for RescueRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RescueRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status. Serialised in kebab-case (`in-progress`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RescueStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Assigned,
    Rescued,
    InProgress,
    Completed,
    Cancelled,
}

impl RescueStatus {
    pub const ALL: [RescueStatus; 8] = [
        RescueStatus::Pending,
        RescueStatus::Approved,
        RescueStatus::Rejected,
        RescueStatus::Assigned,
        RescueStatus::Rescued,
        RescueStatus::InProgress,
        RescueStatus::Completed,
        RescueStatus::Cancelled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Assigned => "assigned",
            Self::Rescued => "rescued",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RescueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised status text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rescue request status: {value}")]
pub struct UnknownStatus {
    pub value: String,
}

impl FromStr for RescueStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RescueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                value: s.to_owned(),
            })
    }
}

/// Opaque location hint supplied by the reporter. Stored, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One entry of the append-only progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Validation failures for rescue request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescueRequestValidationError {
    MissingDescriptionOrLocation,
    EmptyDescription,
    EmptyLocation,
    EmptyUpdateMessage { index: usize },
    AssigneeRequired,
    AssigneeOutsideAssignment,
    StaleUpdatesReplacement,
}

impl fmt::Display for RescueRequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDescriptionOrLocation => {
                write!(f, "Description and location are required")
            }
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::EmptyLocation => write!(f, "location must not be empty"),
            Self::EmptyUpdateMessage { index } => {
                write!(f, "update message at index {index} must not be empty")
            }
            Self::AssigneeRequired => {
                write!(f, "assignedTo is required when assigning a rescue request")
            }
            Self::AssigneeOutsideAssignment => {
                write!(f, "assignedTo may only be set when assigning a rescue request")
            }
            Self::StaleUpdatesReplacement => write!(
                f,
                "replacement updates must start with the existing update history"
            ),
        }
    }
}

impl std::error::Error for RescueRequestValidationError {}

impl From<RescueRequestValidationError> for Error {
    fn from(value: RescueRequestValidationError) -> Self {
        Error::invalid_request(value.to_string())
    }
}

/// Fields supplied when an informer files a request.
#[derive(Debug, Clone)]
pub struct NewRescueRequest {
    pub informer: UserId,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Stored state of a request, used by adapters to rebuild the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueRequestSnapshot {
    pub id: RescueRequestId,
    pub informer: UserId,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub status: RescueStatus,
    pub assigned_to: Option<UserId>,
    pub updates: Vec<UpdateEntry>,
    pub created_at: DateTime<Utc>,
}

/// A rescue request.
///
/// ## Invariants
/// - `informer` and `created_at` never change after creation.
/// - `description` and `location` are trimmed and non-empty.
/// - `updates` only grows; existing entries are never rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueRequest {
    id: RescueRequestId,
    informer: UserId,
    description: String,
    location: String,
    image_url: Option<String>,
    coordinates: Option<Coordinates>,
    status: RescueStatus,
    assigned_to: Option<UserId>,
    updates: Vec<UpdateEntry>,
    created_at: DateTime<Utc>,
}

pub(crate) fn required_text(
    value: &str,
    empty: RescueRequestValidationError,
) -> Result<String, RescueRequestValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    Ok(trimmed.to_owned())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl RescueRequest {
    /// File a new request in `pending` with the creation entry logged.
    pub fn create(
        fields: NewRescueRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, RescueRequestValidationError> {
        let NewRescueRequest {
            informer,
            description,
            location,
            image_url,
            coordinates,
        } = fields;

        let missing = RescueRequestValidationError::MissingDescriptionOrLocation;
        Ok(Self {
            id: RescueRequestId::random(),
            informer,
            description: required_text(&description, missing.clone())?,
            location: required_text(&location, missing)?,
            image_url: optional_text(image_url),
            coordinates,
            status: RescueStatus::Pending,
            assigned_to: None,
            updates: vec![UpdateEntry {
                message: CREATED_UPDATE_MESSAGE.to_owned(),
                timestamp: now,
            }],
            created_at: now,
        })
    }

    /// Rebuild from storage, re-checking the text invariants.
    pub fn restore(snapshot: RescueRequestSnapshot) -> Result<Self, RescueRequestValidationError> {
        let RescueRequestSnapshot {
            id,
            informer,
            description,
            location,
            image_url,
            coordinates,
            status,
            assigned_to,
            updates,
            created_at,
        } = snapshot;

        Ok(Self {
            id,
            informer,
            description: required_text(&description, RescueRequestValidationError::EmptyDescription)?,
            location: required_text(&location, RescueRequestValidationError::EmptyLocation)?,
            image_url,
            coordinates,
            status,
            assigned_to,
            updates,
            created_at,
        })
    }

    pub fn id(&self) -> RescueRequestId {
        self.id
    }

    pub fn informer(&self) -> &UserId {
        &self.informer
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn status(&self) -> RescueStatus {
        self.status
    }

    pub fn assigned_to(&self) -> Option<&UserId> {
        self.assigned_to.as_ref()
    }

    pub fn updates(&self) -> &[UpdateEntry] {
        &self.updates
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<RescueRequest> for RescueRequestSnapshot {
    fn from(value: RescueRequest) -> Self {
        Self {
            id: value.id,
            informer: value.informer,
            description: value.description,
            location: value.location,
            image_url: value.image_url,
            coordinates: value.coordinates,
            status: value.status,
            assigned_to: value.assigned_to,
            updates: value.updates,
            created_at: value.created_at,
        }
    }
}
