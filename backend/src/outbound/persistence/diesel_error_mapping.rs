//! Shared Diesel error mapping for the PawResQ repositories.
//!
//! Every repository port exposes the same `Connection`/`Query` pair, so the
//! translation is written once here and parameterised by the port error's
//! constructors. Unique violations are surfaced separately because the user
//! repository turns them into duplicate-username/email errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Name of the violated unique constraint, when `error` is one.
pub(crate) fn unique_violation(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Map Diesel errors into query/connection constructors.
///
/// Storage details stay in the debug log; the domain only sees a short,
/// stable message.
pub(crate) fn map_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            query("database value could not be converted")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => connection("database connection error"),
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    fn mapped(error: DieselError) -> Mapped {
        map_diesel_error(
            error,
            |message| Mapped::Query(message.to_owned()),
            |message| Mapped::Connection(message.to_owned()),
        )
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(
            mapped(error),
            Mapped::Connection("database connection error".to_owned())
        );
    }

    #[rstest]
    #[case(DieselError::NotFound, "record not found")]
    #[case(
        DieselError::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new("violates check constraint".to_owned()),
        ),
        "database error"
    )]
    fn other_failures_map_to_query(#[case] error: DieselError, #[case] expected: &str) {
        assert_eq!(mapped(error), Mapped::Query(expected.to_owned()));
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped: Mapped = map_pool_error(PoolError::checkout("timed out"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("timed out".to_owned()));
    }

    #[rstest]
    fn unique_violation_is_detected() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert!(unique_violation(&error).is_some());
        assert!(unique_violation(&DieselError::NotFound).is_none());
    }
}
