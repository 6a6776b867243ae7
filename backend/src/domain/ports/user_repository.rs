//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Role, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the username.
        DuplicateUsername => "username already taken",
        /// Another account already uses the email address.
        DuplicateEmail => "email already taken",
    }
}

/// Exact-match filters for listing users. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role() == role)
            && self.is_active.is_none_or(|active| user.is_active() == active)
    }
}

/// Account storage. Counter columns are never written through this port;
/// see [`super::CounterStore`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, enforcing username and email uniqueness.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Persist account fields (profile, role, activity, last login).
    async fn save(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by login handle.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch every user whose id is listed. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// List users matching the filter, newest account first.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, UserPersistenceError>;
}
