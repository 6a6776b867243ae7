//! Merge semantics for partial rescue request edits.
//!
//! Only supplied fields change. The `updates` log is appended to; the legacy
//! full-list form is accepted only when it extends the stored history.

use chrono::{DateTime, Utc};

use super::{
    Coordinates, RescueRequest, RescueRequestValidationError, RescueStatus, UpdateEntry,
    required_text,
};
use crate::domain::UserId;

/// How the caller wants the progress log changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UpdatesChange {
    /// Leave the log untouched.
    #[default]
    Keep,
    /// Append these messages, timestamped by the server.
    Append(Vec<String>),
    /// Legacy form: the caller's full copy of the log. Must start with the
    /// stored messages; only the new tail is appended.
    Replace(Vec<String>),
}

/// A partial edit of a rescue request.
#[derive(Debug, Clone, Default)]
pub struct RescueRequestChanges {
    pub description: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub status: Option<RescueStatus>,
    pub assigned_to: Option<UserId>,
    pub updates: UpdatesChange,
}

impl RescueRequestChanges {
    /// The requested status, when it differs from `current`.
    pub fn status_change(&self, current: RescueStatus) -> Option<RescueStatus> {
        self.status.filter(|status| *status != current)
    }
}

fn clean_messages(messages: Vec<String>) -> Result<Vec<String>, RescueRequestValidationError> {
    messages
        .into_iter()
        .enumerate()
        .map(|(index, message)| {
            required_text(
                &message,
                RescueRequestValidationError::EmptyUpdateMessage { index },
            )
        })
        .collect()
}

impl RescueRequest {
    /// Merge `changes` into the request.
    ///
    /// Transition validity and authorization are the caller's concern; this
    /// only enforces field-level rules.
    pub fn apply_changes(
        mut self,
        changes: RescueRequestChanges,
        now: DateTime<Utc>,
    ) -> Result<Self, RescueRequestValidationError> {
        let next_status = changes.status_change(self.status);
        let RescueRequestChanges {
            description,
            location,
            image_url,
            coordinates,
            status: _,
            assigned_to,
            updates,
        } = changes;

        self.assigned_to = self.resolve_assignee(next_status, assigned_to)?;

        if let Some(description) = description {
            self.description =
                required_text(&description, RescueRequestValidationError::EmptyDescription)?;
        }
        if let Some(location) = location {
            self.location = required_text(&location, RescueRequestValidationError::EmptyLocation)?;
        }
        if let Some(image_url) = image_url {
            let trimmed = image_url.trim();
            self.image_url = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        }
        if let Some(coordinates) = coordinates {
            self.coordinates = Some(coordinates);
        }
        if let Some(status) = next_status {
            self.status = status;
        }

        let appended = match updates {
            UpdatesChange::Keep => Vec::new(),
            UpdatesChange::Append(messages) => clean_messages(messages)?,
            UpdatesChange::Replace(messages) => self.new_tail(clean_messages(messages)?)?,
        };
        self.updates.extend(appended.into_iter().map(|message| UpdateEntry {
            message,
            timestamp: now,
        }));

        Ok(self)
    }

    fn resolve_assignee(
        &self,
        next_status: Option<RescueStatus>,
        supplied: Option<UserId>,
    ) -> Result<Option<UserId>, RescueRequestValidationError> {
        let assigning = next_status == Some(RescueStatus::Assigned);
        match (assigning, supplied) {
            (true, Some(volunteer)) => Ok(Some(volunteer)),
            (true, None) => Err(RescueRequestValidationError::AssigneeRequired),
            // Clients that echo the current assignee back are not assigning.
            (false, Some(volunteer)) if self.assigned_to.as_ref() == Some(&volunteer) => {
                Ok(Some(volunteer))
            }
            (false, Some(_)) => Err(RescueRequestValidationError::AssigneeOutsideAssignment),
            (false, None) => Ok(self.assigned_to.clone()),
        }
    }

    fn new_tail(&self, supplied: Vec<String>) -> Result<Vec<String>, RescueRequestValidationError> {
        let mut supplied = supplied.into_iter();
        for stored in &self.updates {
            match supplied.next() {
                Some(message) if message == stored.message => {}
                _ => return Err(RescueRequestValidationError::StaleUpdatesReplacement),
            }
        }
        Ok(supplied.collect())
    }
}
