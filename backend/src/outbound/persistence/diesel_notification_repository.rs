//! PostgreSQL-backed `NotificationRepository` implementation.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Nullable};
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{
    Audience, Notification, NotificationId, NotificationSnapshot, NotificationTarget,
    RescueRequestId, Role, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed implementation of the `NotificationRepository` port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

type AudienceFilter = Box<dyn BoxableExpression<notifications::table, Pg, SqlType = Nullable<Bool>>>;

/// Rows addressed to the reader directly or to their role.
fn addressed_to(audience: &Audience) -> AudienceFilter {
    Box::new(
        notifications::target_user_id
            .eq(*audience.user_id.as_uuid())
            .or(notifications::target_role.eq(audience.role.as_str())),
    )
}

fn pool_error(error: PoolError) -> NotificationRepositoryError {
    map_pool_error(error, NotificationRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn row_to_notification(row: NotificationRow) -> Result<Notification, NotificationRepositoryError> {
    let corrupt = |detail: String| {
        warn!(notification_id = %row.id, %detail, "stored notification row is invalid");
        NotificationRepositoryError::query(format!("stored notification {} is invalid", row.id))
    };

    let role = row
        .target_role
        .as_deref()
        .map(Role::from_str)
        .transpose()
        .map_err(|err| corrupt(err.to_string()))?;
    let target = NotificationTarget::new(row.target_user_id.map(UserId::from_uuid), role)
        .map_err(|err| corrupt(err.to_string()))?;

    Notification::restore(NotificationSnapshot {
        id: NotificationId::from_uuid(row.id),
        kind: row.kind.clone(),
        target,
        content: row.content.clone(),
        rescue_request_id: row.rescue_request_id.map(RescueRequestId::from_uuid),
        is_read: row.is_read,
        created_at: row.created_at,
    })
    .map_err(|err| corrupt(err.to_string()))
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        let target = notification.target();
        let row = NewNotificationRow {
            id: *notification.id().as_uuid(),
            kind: notification.kind(),
            target_user_id: target.user_id().map(|id| *id.as_uuid()),
            target_role: target.target_role().map(Role::as_str),
            content: notification.content(),
            rescue_request_id: notification.rescue_request_id().map(|id| *id.as_uuid()),
            is_read: notification.is_read(),
            created_at: notification.created_at(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn list_for(
        &self,
        audience: &Audience,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut query = notifications::table
            .filter(addressed_to(audience))
            .select(NotificationRow::as_select())
            .order(notifications::created_at.desc())
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(row_to_notification).collect()
    }

    async fn count_unread(&self, audience: &Audience) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = notifications::table
            .filter(addressed_to(audience))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn mark_read(
        &self,
        audience: &Audience,
        ids: Option<Vec<NotificationId>>,
    ) -> Result<u64, NotificationRepositoryError> {
        let unread = notifications::table
            .filter(addressed_to(audience))
            .filter(notifications::is_read.eq(false));

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changed = match ids {
            Some(ids) => {
                let ids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
                diesel::update(unread.filter(notifications::id.eq_any(ids)))
                    .set(notifications::is_read.eq(true))
                    .execute(&mut conn)
                    .await
            }
            None => {
                diesel::update(unread)
                    .set(notifications::is_read.eq(true))
                    .execute(&mut conn)
                    .await
            }
        }
        .map_err(diesel_error)?;
        Ok(u64::try_from(changed).unwrap_or_default())
    }
}
