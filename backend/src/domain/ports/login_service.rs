//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call this port to authenticate credentials without
//! knowing the backing account store.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials, record the login time and return the user id.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail
    /// with the same `unauthorized` error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}
