//! Outbound adapters implementing the domain's repository ports.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories for running without a database
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no lifecycle rules.

pub mod memory;
pub mod persistence;
