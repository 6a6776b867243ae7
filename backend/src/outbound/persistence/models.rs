//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{notifications, rescue_requests, users};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub area: Option<String>,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub rescues_completed: i64,
    pub rescues_in_progress: i64,
    pub rescues_rescued: i64,
    pub save_count: i64,
    pub help_count: i64,
    pub requests_submitted: i64,
    pub requests_approved: i64,
    pub requests_rejected: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub area: Option<&'a str>,
    pub profile_picture: &'a str,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub rescues_completed: i64,
    pub rescues_in_progress: i64,
    pub rescues_rescued: i64,
    pub save_count: i64,
    pub help_count: i64,
    pub requests_submitted: i64,
    pub requests_approved: i64,
    pub requests_rejected: i64,
    pub created_at: DateTime<Utc>,
}

/// Changeset for account fields. Counter columns are absent; they only move
/// through atomic increments.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub area: Option<&'a str>,
    pub profile_picture: &'a str,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Rescue request models
// ---------------------------------------------------------------------------

/// Row struct for reading from the rescue_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rescue_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RescueRequestRow {
    pub id: Uuid,
    pub informer_id: Uuid,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub updates: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new rescue request records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rescue_requests)]
pub(crate) struct NewRescueRequestRow<'a> {
    pub id: Uuid,
    pub informer_id: Uuid,
    pub description: &'a str,
    pub location: &'a str,
    pub image_url: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: &'a str,
    pub assigned_to: Option<Uuid>,
    pub updates: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Changeset for the mutable rescue request fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rescue_requests)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RescueRequestUpdate<'a> {
    pub description: &'a str,
    pub location: &'a str,
    pub image_url: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: &'a str,
    pub assigned_to: Option<Uuid>,
    pub updates: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Notification models
// ---------------------------------------------------------------------------

/// Row struct for reading from the notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub kind: String,
    pub target_user_id: Option<Uuid>,
    pub target_role: Option<String>,
    pub content: String,
    pub rescue_request_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for storing notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub kind: &'a str,
    pub target_user_id: Option<Uuid>,
    pub target_role: Option<&'a str>,
    pub content: &'a str,
    pub rescue_request_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of a counter adjustment: whether the decrement hit the zero floor.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(crate) struct AdjustedCounterRow {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub clamped: bool,
}

/// Stored counters are non-negative by constraint; a negative read is
/// treated as zero.
pub(crate) fn counter_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

pub(crate) fn counter_for_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
