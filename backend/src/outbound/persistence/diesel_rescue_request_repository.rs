//! PostgreSQL-backed `RescueRequestRepository` implementation.
//!
//! The progress log is stored as a JSONB array and round-trips through
//! `serde_json`; coordinates are split into two nullable columns.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{
    RescueRequestFilter, RescueRequestRepository, RescueRequestRepositoryError, StatusCountScope,
    StatusCounts,
};
use crate::domain::{
    Coordinates, RescueRequest, RescueRequestId, RescueRequestSnapshot, RescueStatus, UpdateEntry,
    UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRescueRequestRow, RescueRequestRow, RescueRequestUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::rescue_requests;

/// Diesel-backed implementation of the `RescueRequestRepository` port.
#[derive(Clone)]
pub struct DieselRescueRequestRepository {
    pool: DbPool,
}

impl DieselRescueRequestRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RescueRequestRepositoryError {
    map_pool_error(error, RescueRequestRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RescueRequestRepositoryError {
    map_diesel_error(
        error,
        RescueRequestRepositoryError::query,
        RescueRequestRepositoryError::connection,
    )
}

fn corrupt(id: uuid::Uuid, field: &str, detail: &dyn std::fmt::Display) -> RescueRequestRepositoryError {
    warn!(request_id = %id, field, %detail, "stored rescue request row is invalid");
    RescueRequestRepositoryError::query(format!("stored rescue request {id} has invalid {field}"))
}

fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

fn row_to_request(row: RescueRequestRow) -> Result<RescueRequest, RescueRequestRepositoryError> {
    let id = row.id;
    let status = RescueStatus::from_str(&row.status).map_err(|err| corrupt(id, "status", &err))?;
    let updates: Vec<UpdateEntry> =
        serde_json::from_value(row.updates).map_err(|err| corrupt(id, "updates", &err))?;

    RescueRequest::restore(RescueRequestSnapshot {
        id: RescueRequestId::from_uuid(id),
        informer: UserId::from_uuid(row.informer_id),
        description: row.description,
        location: row.location,
        image_url: row.image_url,
        coordinates: coordinates(row.latitude, row.longitude),
        status,
        assigned_to: row.assigned_to.map(UserId::from_uuid),
        updates,
        created_at: row.created_at,
    })
    .map_err(|err| corrupt(id, "text", &err))
}

fn rows_to_requests(
    rows: Vec<RescueRequestRow>,
) -> Result<Vec<RescueRequest>, RescueRequestRepositoryError> {
    rows.into_iter().map(row_to_request).collect()
}

fn updates_json(request: &RescueRequest) -> Result<serde_json::Value, RescueRequestRepositoryError> {
    serde_json::to_value(request.updates()).map_err(|err| {
        RescueRequestRepositoryError::query(format!("failed to encode progress log: {err}"))
    })
}

#[async_trait]
impl RescueRequestRepository for DieselRescueRequestRepository {
    async fn insert(&self, request: &RescueRequest) -> Result<(), RescueRequestRepositoryError> {
        let updates = updates_json(request)?;
        let coordinates = request.coordinates();
        let row = NewRescueRequestRow {
            id: *request.id().as_uuid(),
            informer_id: *request.informer().as_uuid(),
            description: request.description(),
            location: request.location(),
            image_url: request.image_url(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            status: request.status().as_str(),
            assigned_to: request.assigned_to().map(|id| *id.as_uuid()),
            updates: &updates,
            created_at: request.created_at(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(rescue_requests::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn save(&self, request: &RescueRequest) -> Result<bool, RescueRequestRepositoryError> {
        let updates = updates_json(request)?;
        let coordinates = request.coordinates();
        let changes = RescueRequestUpdate {
            description: request.description(),
            location: request.location(),
            image_url: request.image_url(),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            status: request.status().as_str(),
            assigned_to: request.assigned_to().map(|id| *id.as_uuid()),
            updates: &updates,
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(rescue_requests::table.find(*request.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated == 1)
    }

    async fn find_by_id(
        &self,
        id: &RescueRequestId,
    ) -> Result<Option<RescueRequest>, RescueRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = rescue_requests::table
            .find(*id.as_uuid())
            .select(RescueRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_request).transpose()
    }

    async fn list(
        &self,
        filter: &RescueRequestFilter,
    ) -> Result<Vec<RescueRequest>, RescueRequestRepositoryError> {
        let mut query = rescue_requests::table
            .select(RescueRequestRow::as_select())
            .order(rescue_requests::created_at.desc())
            .into_boxed();
        if !filter.statuses.is_empty() {
            let statuses: Vec<&'static str> =
                filter.statuses.iter().map(|status| status.as_str()).collect();
            query = query.filter(rescue_requests::status.eq_any(statuses));
        }
        if let Some(informer) = &filter.informer {
            query = query.filter(rescue_requests::informer_id.eq(*informer.as_uuid()));
        }
        if let Some(assignee) = &filter.assigned_to {
            query = query.filter(rescue_requests::assigned_to.eq(*assignee.as_uuid()));
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = query.load(&mut conn).await.map_err(diesel_error)?;
        rows_to_requests(rows)
    }

    async fn delete(&self, id: &RescueRequestId) -> Result<bool, RescueRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(rescue_requests::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted == 1)
    }

    async fn status_counts(
        &self,
        scope: &StatusCountScope,
    ) -> Result<StatusCounts, RescueRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let grouped: Vec<(String, i64)> = match scope {
            StatusCountScope::Informer(id) => {
                rescue_requests::table
                    .filter(rescue_requests::informer_id.eq(*id.as_uuid()))
                    .group_by(rescue_requests::status)
                    .select((rescue_requests::status, count_star()))
                    .load(&mut conn)
                    .await
            }
            StatusCountScope::Assignee(id) => {
                rescue_requests::table
                    .filter(rescue_requests::assigned_to.eq(*id.as_uuid()))
                    .group_by(rescue_requests::status)
                    .select((rescue_requests::status, count_star()))
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(diesel_error)?;

        let mut counts = StatusCounts::default();
        for (status, count) in grouped {
            match RescueStatus::from_str(&status) {
                Ok(status) => counts.record(status, u64::try_from(count).unwrap_or_default()),
                Err(_) => warn!(%status, "ignoring unknown status in counts"),
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;
    use serde_json::json;

    fn row(status: &str, updates: serde_json::Value) -> RescueRequestRow {
        RescueRequestRow {
            id: uuid::Uuid::new_v4(),
            informer_id: uuid::Uuid::new_v4(),
            description: "Dog trapped behind fence".to_owned(),
            location: "Mill Lane".to_owned(),
            image_url: None,
            latitude: Some(51.5),
            longitude: None,
            status: status.to_owned(),
            assigned_to: None,
            updates,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).single().expect("timestamp"),
        }
    }

    #[rstest]
    fn rows_restore_status_and_progress_log() {
        let stored = row(
            "in-progress",
            json!([{ "message": "Rescue request created", "timestamp": "2026-03-14T09:00:00Z" }]),
        );

        let request = row_to_request(stored).expect("valid row");

        assert_eq!(request.status(), RescueStatus::InProgress);
        assert_eq!(request.updates().len(), 1);
        assert!(request.coordinates().is_none(), "half a coordinate pair is dropped");
    }

    #[rstest]
    #[case(row("lost", json!([])))]
    #[case(row("pending", json!({ "message": "not an array" })))]
    fn invalid_rows_are_query_errors(#[case] stored: RescueRequestRow) {
        assert!(matches!(
            row_to_request(stored),
            Err(RescueRequestRepositoryError::Query { .. })
        ));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("closed".to_owned()),
        );
        assert!(matches!(
            diesel_error(error),
            RescueRequestRepositoryError::Connection { .. }
        ));
    }
}
