//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` with `bb8` pooling.
//!
//! - **Thin adapters**: repositories translate between row structs and
//!   domain types; lifecycle rules live in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic counters**: statistics counters move through single-statement
//!   increments, never read-modify-write.
//! - **Strongly typed errors**: database failures map onto each port's
//!   `Connection`/`Query` variants.
//!
//! # Example
//!
//! ```ignore
//! use pawresq::outbound::persistence::{DbPool, PoolConfig, DieselUserRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/pawresq")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_notification_repository;
mod diesel_rescue_request_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_rescue_request_repository::DieselRescueRequestRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
