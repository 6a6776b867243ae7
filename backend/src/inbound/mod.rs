//! Inbound adapters that turn external requests into domain service calls.
//!
//! Only the REST API exists today; see [`http`].

pub mod http;
