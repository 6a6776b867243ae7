//! PostgreSQL-backed `UserRepository` and `CounterStore` implementations.
//!
//! Accounts and their statistics counters share the `users` table. Account
//! writes go through a changeset that never touches the counter columns, so
//! a profile save cannot clobber an increment that landed in between.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{CounterStore, CounterStoreError, UserFilter, UserPersistenceError, UserRepository};
use crate::domain::{
    Area, CounterAdjustment, CounterDelta, EmailAddress, PasswordHash, Role, User, UserDraft,
    UserId, UserStatistics, Username,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{
    AdjustedCounterRow, NewUserRow, UserRow, UserUpdate, counter_for_db, counter_from_db,
};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the user and counter ports.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match unique_violation(&error) {
        Some(USERNAME_CONSTRAINT) => UserPersistenceError::duplicate_username(),
        Some(EMAIL_CONSTRAINT) => UserPersistenceError::duplicate_email(),
        _ => map_diesel_error(
            error,
            UserPersistenceError::query,
            UserPersistenceError::connection,
        ),
    }
}

fn counter_diesel_error(error: diesel::result::Error) -> CounterStoreError {
    map_diesel_error(error, CounterStoreError::query, CounterStoreError::connection)
}

/// Convert a database row into a domain user, re-validating every field.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let corrupt = |field: &str, detail: String| {
        warn!(user_id = %row.id, field, %detail, "stored user row is invalid");
        UserPersistenceError::query(format!("stored user {} has invalid {field}", row.id))
    };

    let username = Username::new(&row.username).map_err(|err| corrupt("username", err.to_string()))?;
    let email = EmailAddress::new(&row.email).map_err(|err| corrupt("email", err.to_string()))?;
    let role = Role::from_str(&row.role).map_err(|err| corrupt("role", err.to_string()))?;
    let area = row
        .area
        .as_deref()
        .map(Area::new)
        .transpose()
        .map_err(|err| corrupt("area", err.to_string()))?;

    let statistics = UserStatistics {
        rescues_completed: counter_from_db(row.rescues_completed),
        rescues_in_progress: counter_from_db(row.rescues_in_progress),
        rescues_rescued: counter_from_db(row.rescues_rescued),
        save_count: counter_from_db(row.save_count),
        help_count: counter_from_db(row.help_count),
        requests_submitted: counter_from_db(row.requests_submitted),
        requests_approved: counter_from_db(row.requests_approved),
        requests_rejected: counter_from_db(row.requests_rejected),
    };

    User::new(UserDraft {
        id: UserId::from_uuid(row.id),
        name: row.name.clone(),
        username,
        email,
        password_hash: PasswordHash::from_phc(row.password_hash.clone()),
        role,
        area,
        profile_picture: row.profile_picture.clone(),
        is_active: row.is_active,
        last_login: row.last_login,
        statistics,
        created_at: row.created_at,
    })
    .map_err(|err| corrupt("account", err.to_string()))
}

fn rows_to_users(rows: Vec<UserRow>) -> Result<Vec<User>, UserPersistenceError> {
    rows.into_iter().map(row_to_user).collect()
}

fn new_row(user: &User) -> NewUserRow<'_> {
    let statistics = user.statistics();
    NewUserRow {
        id: *user.id().as_uuid(),
        name: user.name(),
        username: user.username().as_str(),
        email: user.email().as_str(),
        password_hash: user.password_hash().as_phc(),
        role: user.role().as_str(),
        area: user.area().map(Area::as_str),
        profile_picture: user.profile_picture(),
        is_active: user.is_active(),
        last_login: user.last_login(),
        rescues_completed: counter_for_db(statistics.rescues_completed),
        rescues_in_progress: counter_for_db(statistics.rescues_in_progress),
        rescues_rescued: counter_for_db(statistics.rescues_rescued),
        save_count: counter_for_db(statistics.save_count),
        help_count: counter_for_db(statistics.help_count),
        requests_submitted: counter_for_db(statistics.requests_submitted),
        requests_approved: counter_for_db(statistics.requests_approved),
        requests_rejected: counter_for_db(statistics.requests_rejected),
        created_at: user.created_at(),
    }
}

fn update_row(user: &User) -> UserUpdate<'_> {
    UserUpdate {
        name: user.name(),
        email: user.email().as_str(),
        password_hash: user.password_hash().as_phc(),
        role: user.role().as_str(),
        area: user.area().map(Area::as_str),
        profile_picture: user.profile_picture(),
        is_active: user.is_active(),
        last_login: user.last_login(),
    }
}

/// One statement per adjustment. The sub-select locks the row before reading
/// the old value, so the clamp flag and the new value agree even when other
/// transactions move the same counter.
fn adjust_sql(column: &str) -> String {
    format!(
        "UPDATE users SET {column} = GREATEST(users.{column} + $2, 0) \
         FROM (SELECT id, {column} AS value FROM users WHERE id = $1 FOR UPDATE) AS previous \
         WHERE users.id = previous.id \
         RETURNING previous.value + $2 < 0 AS clamped"
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(users::table)
            .values(&new_row(user))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.find(*user.id().as_uuid()))
            .set(&update_row(user))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(UserPersistenceError::query(format!(
                "user {} does not exist",
                user.id()
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .filter(users::username.eq(username.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_users(rows)
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = users::table
            .select(UserRow::as_select())
            .order(users::created_at.desc())
            .into_boxed();
        if let Some(role) = filter.role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        if let Some(active) = filter.is_active {
            query = query.filter(users::is_active.eq(active));
        }
        let rows = query.load(&mut conn).await.map_err(diesel_error)?;
        rows_to_users(rows)
    }
}

#[async_trait]
impl CounterStore for DieselUserRepository {
    async fn adjust(&self, delta: &CounterDelta) -> Result<CounterAdjustment, CounterStoreError> {
        let column = delta.counter.column_name();
        let user_id = *delta.user_id.as_uuid();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CounterStoreError::connection))?;

        let rows: Vec<AdjustedCounterRow> = diesel::sql_query(adjust_sql(column))
            .bind::<SqlUuid, _>(user_id)
            .bind::<BigInt, _>(delta.delta)
            .load(&mut conn)
            .await
            .map_err(counter_diesel_error)?;
        Ok(match rows.as_slice().first() {
            None => CounterAdjustment::UserMissing,
            Some(row) if row.clamped => CounterAdjustment::Clamped,
            Some(_) => CounterAdjustment::Applied,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping, row conversion and SQL shape. The statements themselves
    //! run against PostgreSQL in `tests/diesel_*.rs`.
    use super::*;
    use chrono::{TimeZone, Utc};
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    struct ConstraintInfo(&'static str);

    impl DatabaseErrorInformation for ConstraintInfo {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("users")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn unique(constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(ConstraintInfo(constraint)),
        )
    }

    fn row(role: &str, area: Option<&str>) -> UserRow {
        UserRow {
            id: uuid::Uuid::new_v4(),
            name: "Rina Das".to_owned(),
            username: "rina".to_owned(),
            email: "rina@example.org".to_owned(),
            password_hash: "$argon2id$v=19$stub".to_owned(),
            role: role.to_owned(),
            area: area.map(str::to_owned),
            profile_picture: String::new(),
            is_active: true,
            last_login: None,
            rescues_completed: 1,
            rescues_in_progress: 2,
            rescues_rescued: 3,
            save_count: 4,
            help_count: 5,
            requests_submitted: 6,
            requests_approved: 7,
            requests_rejected: -1,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).single().expect("timestamp"),
        }
    }

    #[rstest]
    #[case(USERNAME_CONSTRAINT, UserPersistenceError::duplicate_username())]
    #[case(EMAIL_CONSTRAINT, UserPersistenceError::duplicate_email())]
    fn unique_violations_name_the_field(
        #[case] constraint: &'static str,
        #[case] expected: UserPersistenceError,
    ) {
        assert_eq!(diesel_error(unique(constraint)), expected);
    }

    #[rstest]
    fn unknown_unique_violation_is_a_query_error() {
        let mapped = diesel_error(unique("users_pkey"));
        assert!(matches!(mapped, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("closed".to_owned()),
        );
        assert!(matches!(
            diesel_error(error),
            UserPersistenceError::Connection { .. }
        ));
    }

    #[rstest]
    fn rows_convert_counters_and_role() {
        let user = row_to_user(row("volunteer", Some("North"))).expect("valid row");

        assert_eq!(user.role(), Role::Volunteer);
        assert_eq!(user.area().map(Area::as_str), Some("North"));
        assert_eq!(user.statistics().save_count, 4);
        assert_eq!(user.statistics().requests_rejected, 0);
    }

    #[rstest]
    #[case(row("wizard", None))]
    #[case(row("volunteer", None))]
    fn invalid_rows_are_query_errors(#[case] stored: UserRow) {
        assert!(matches!(
            row_to_user(stored),
            Err(UserPersistenceError::Query { .. })
        ));
    }

    #[rstest]
    fn counter_sql_is_a_single_locked_statement() {
        let sql = adjust_sql("save_count");
        assert!(sql.starts_with("UPDATE users SET save_count = GREATEST(users.save_count + $2, 0)"));
        assert!(sql.contains("SELECT id, save_count AS value FROM users WHERE id = $1 FOR UPDATE"));
        assert!(sql.ends_with("RETURNING previous.value + $2 < 0 AS clamped"));
        assert!(!sql.contains("help_count"));
    }
}
