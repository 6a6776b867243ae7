//! Driving port for account reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, User, UserId};

use super::UserFilter;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Resolve a session user into an acting identity.
    ///
    /// Unknown and inactive accounts are `unauthorized`, so a session that
    /// outlives its account cannot act.
    async fn actor(&self, user_id: &UserId) -> Result<Actor, Error>;

    /// The caller's own account.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Accounts matching `filter`. Admins and team leaders only.
    async fn list_users(&self, actor: &Actor, filter: &UserFilter) -> Result<Vec<User>, Error>;

    /// One account by id. Admins and team leaders only.
    async fn get_user(&self, actor: &Actor, user_id: &UserId) -> Result<User, Error>;
}
