//! In-process adapters for the repository ports.
//!
//! Used when the server starts without a database URL and by the HTTP
//! integration tests. State lives behind `std::sync::Mutex` and is lost on
//! shutdown. Every operation holds the lock for its whole read-modify-write,
//! so counter adjustments are as atomic here as in PostgreSQL.

mod notifications;
mod rescue_requests;
mod users;

pub use notifications::InMemoryNotificationRepository;
pub use rescue_requests::InMemoryRescueRequestRepository;
pub use users::InMemoryUserRepository;

/// Message used when a previous holder of the lock panicked.
const POISONED: &str = "in-memory store lock poisoned";
