//! Shared helpers for the PostgreSQL-backed integration suites.
//!
//! Each `tests/diesel_*.rs` file compiles as its own crate and pulls this
//! module in with `mod support;`.

pub mod embedded_postgres;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pawresq::domain::{
    Area, EmailAddress, PasswordHash, Role, User, UserDraft, UserId, UserStatistics, Username,
};

pub use embedded_postgres::{MigratedDatabase, migrated_database};

/// Whole-second timestamps so values survive the round trip through
/// `TIMESTAMPTZ` unchanged; `minutes` orders records.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
        + Duration::minutes(minutes)
}

/// An active account. Volunteers get an area; the hash never verifies.
pub fn account(handle: &str, role: Role, statistics: UserStatistics) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: format!("{handle} tester"),
        username: Username::new(handle).expect("valid username"),
        email: EmailAddress::new(format!("{handle}@example.org")).expect("valid email"),
        password_hash: PasswordHash::from_phc("$argon2id$v=19$fixture"),
        role,
        area: (role == Role::Volunteer).then(|| Area::new("Riverside").expect("valid area")),
        profile_picture: String::new(),
        is_active: true,
        last_login: None,
        statistics,
        created_at: at(0),
    })
    .expect("valid user")
}

/// Returns true when `SKIP_TEST_CLUSTER` is set to "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when `SKIP_TEST_CLUSTER` is truthy, otherwise fail loudly
/// so a broken cluster is not mistaken for a passing suite.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
