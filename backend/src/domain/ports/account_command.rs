//! Driving port for account mutations: registration, profile edits and role
//! changes.

use async_trait::async_trait;

use crate::domain::{Actor, Area, EmailAddress, Error, Password, Role, User, UserId, Username};

/// Validated self-registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
    pub role: Role,
    pub area: Option<Area>,
}

/// Profile edits requested by the account owner. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub email: Option<EmailAddress>,
    pub profile_picture: Option<String>,
    pub password: Option<Password>,
    pub area: Option<Area>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account with zeroed statistics.
    ///
    /// # Errors
    ///
    /// `invalid_request` for the admin role or a volunteer without an area,
    /// `conflict` when the username or email is taken.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Apply the owner's profile edits.
    async fn update_profile(&self, user_id: &UserId, edit: ProfileEdit) -> Result<User, Error>;

    /// Change another account's role. Admin only.
    async fn update_role(
        &self,
        actor: &Actor,
        user_id: &UserId,
        role: Role,
        area: Option<Area>,
    ) -> Result<User, Error>;
}
