//! Account services: authentication, registration and profile management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountCommand, AccountQuery, LoginService, ProfileEdit, Registration, UserFilter,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Actor, Area, Error, LoginCredentials, Password, PasswordHash, ProfileChanges, Role, User,
    UserDraft, UserId, UserStatistics, UserValidationError, Username,
};

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Account service implementing the login and account driving ports.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U> AccountService<U> {
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateUsername => Error::conflict("Username already exists"),
        UserPersistenceError::DuplicateEmail => Error::conflict("Email already exists"),
    }
}

fn map_validation_error(error: UserValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

/// Argon2 is CPU-bound; hashing runs on the blocking pool.
async fn hash_password(password: Password) -> Result<PasswordHash, Error> {
    tokio::task::spawn_blocking(move || PasswordHash::generate(&password))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| Error::internal(err.to_string()))
}

async fn verify_password(hash: PasswordHash, candidate: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || hash.verify(&candidate))
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
}

fn require_user_viewer(actor: &Actor) -> Result<(), Error> {
    if actor.role.can_view_users() {
        Ok(())
    } else {
        Err(Error::forbidden("Not authorized to view other users"))
    }
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    async fn load(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[async_trait]
impl<U> LoginService for AccountService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let Some(user) = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let verified =
            verify_password(user.password_hash().clone(), credentials.password().to_owned())
                .await?;
        if !verified || !user.is_active() {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let user = user.with_last_login(self.clock.utc());
        self.users.save(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id(), "user logged in");
        Ok(user.id().clone())
    }
}

#[async_trait]
impl<U> AccountCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let Registration {
            name,
            username,
            email,
            password,
            role,
            area,
        } = registration;

        if !role.is_self_assignable() {
            return Err(Error::invalid_request(format!(
                "role {role} cannot be chosen at registration"
            )));
        }

        let user = User::new(UserDraft {
            id: UserId::random(),
            name,
            username,
            email,
            password_hash: hash_password(password).await?,
            role,
            area,
            profile_picture: String::new(),
            is_active: true,
            last_login: None,
            statistics: UserStatistics::default(),
            created_at: self.clock.utc(),
        })
        .map_err(map_validation_error)?;

        self.users.insert(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id(), role = %user.role(), "user registered");
        Ok(user)
    }

    async fn update_profile(&self, user_id: &UserId, edit: ProfileEdit) -> Result<User, Error> {
        let ProfileEdit {
            name,
            email,
            profile_picture,
            password,
            area,
        } = edit;

        let current = self.load(user_id).await?;
        let password_hash = match password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let updated = current
            .with_profile(ProfileChanges {
                name,
                email,
                profile_picture,
                password_hash,
                area,
            })
            .map_err(map_validation_error)?;

        self.users.save(&updated).await.map_err(map_user_error)?;
        Ok(updated)
    }

    async fn update_role(
        &self,
        actor: &Actor,
        user_id: &UserId,
        role: Role,
        area: Option<Area>,
    ) -> Result<User, Error> {
        if actor.role != Role::Admin {
            return Err(Error::forbidden("Only administrators can change roles"));
        }

        let current = self.load(user_id).await?;
        let previous = current.role();
        let updated = current
            .with_role(role, area)
            .map_err(map_validation_error)?;

        self.users.save(&updated).await.map_err(map_user_error)?;
        info!(user_id = %user_id, from = %previous, to = %role, "role changed");
        Ok(updated)
    }
}

#[async_trait]
impl<U> AccountQuery for AccountService<U>
where
    U: UserRepository,
{
    async fn actor(&self, user_id: &UserId) -> Result<Actor, Error> {
        match self.users.find_by_id(user_id).await.map_err(map_user_error)? {
            Some(user) if user.is_active() => Ok(Actor::new(user.id().clone(), user.role())),
            Some(_) => {
                warn!(user_id = %user_id, "session belongs to an inactive account");
                Err(Error::unauthorized("account is inactive"))
            }
            None => Err(Error::unauthorized("login required")),
        }
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.load(user_id).await
    }

    async fn list_users(&self, actor: &Actor, filter: &UserFilter) -> Result<Vec<User>, Error> {
        require_user_viewer(actor)?;
        self.users.list(filter).await.map_err(map_user_error)
    }

    async fn get_user(&self, actor: &Actor, user_id: &UserId) -> Result<User, Error> {
        if &actor.id != user_id {
            require_user_viewer(actor)?;
        }
        self.load(user_id).await
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
