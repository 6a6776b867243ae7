//! User accounts, roles, and their validated value types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::auth::PasswordHash;
use crate::domain::statistics::UserStatistics;

/// Validation errors raised by user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyName,
    EmptyUsername,
    InvalidEmail,
    EmptyArea,
    AreaRequiredForVolunteer,
    UnknownRole { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyArea => write!(f, "area must not be empty"),
            Self::AreaRequiredForVolunteer => write!(f, "Area is required for volunteers"),
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Account role. Serialised in camelCase (`teamLeader`, `requestChecker`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Volunteer,
    TeamLeader,
    RequestChecker,
    Receptionist,
    Informer,
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Volunteer,
        Role::TeamLeader,
        Role::RequestChecker,
        Role::Receptionist,
        Role::Informer,
        Role::Admin,
    ];

    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::TeamLeader => "teamLeader",
            Self::RequestChecker => "requestChecker",
            Self::Receptionist => "receptionist",
            Self::Informer => "informer",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may be chosen at self-registration.
    pub const fn is_self_assignable(self) -> bool {
        !matches!(self, Self::Admin)
    }

    /// Whether the role may browse other users' accounts and statistics.
    pub const fn can_view_users(self) -> bool {
        matches!(self, Self::Admin | Self::TeamLeader)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UserValidationError::UnknownRole {
                value: s.to_owned(),
            })
    }
}

macro_rules! trimmed_text {
    ($(#[$meta:meta])* $name:ident, $empty:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Trim and validate the supplied text.
            pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err($empty);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the validated text.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = UserValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

trimmed_text!(
    /// Unique login handle.
    Username,
    UserValidationError::EmptyUsername
);
trimmed_text!(
    /// Working area of a volunteer.
    Area,
    UserValidationError::EmptyArea
);

/// Lower-cased, trimmed email address.
///
/// Only the `local@domain` shape is checked; deliverability is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an address.
    pub fn new(value: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = value.as_ref().trim().to_lowercase();
        let valid = normalised
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.contains('@')
            });
        if !valid || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Resolve the area for a role: volunteers must have one, others never keep one.
pub fn area_for_role(role: Role, area: Option<Area>) -> Result<Option<Area>, UserValidationError> {
    match (role, area) {
        (Role::Volunteer, Some(area)) => Ok(Some(area)),
        (Role::Volunteer, None) => Err(UserValidationError::AreaRequiredForVolunteer),
        (_, _) => Ok(None),
    }
}

/// Input used to build a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub name: String,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub area: Option<Area>,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub statistics: UserStatistics,
    pub created_at: DateTime<Utc>,
}

/// A registered account.
///
/// ## Invariants
/// - `name` is trimmed and non-empty.
/// - `area` is present exactly when `role` is [`Role::Volunteer`].
///
/// The password hash is held for verification and is never serialised by
/// any adapter; public representations go through
/// `inbound::http::users::UserProfileBody`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    name: String,
    username: Username,
    email: EmailAddress,
    password_hash: PasswordHash,
    role: Role,
    area: Option<Area>,
    profile_picture: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    statistics: UserStatistics,
    created_at: DateTime<Utc>,
}

impl User {
    /// Validate a draft. A non-volunteer's area is discarded.
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            name,
            username,
            email,
            password_hash,
            role,
            area,
            profile_picture,
            is_active,
            last_login,
            statistics,
            created_at,
        } = draft;

        let name = name.trim();
        if name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            username,
            email,
            password_hash,
            role,
            area: area_for_role(role, area)?,
            profile_picture,
            is_active,
            last_login,
            statistics,
            created_at,
        })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn area(&self) -> Option<&Area> {
        self.area.as_ref()
    }

    pub fn profile_picture(&self) -> &str {
        self.profile_picture.as_str()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Counter snapshot as loaded from storage.
    pub fn statistics(&self) -> &UserStatistics {
        &self.statistics
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record a successful login.
    #[must_use]
    pub fn with_last_login(mut self, at: DateTime<Utc>) -> Self {
        self.last_login = Some(at);
        self
    }

    /// Enable or disable the account.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Replace the counter snapshot, e.g. with the values held in storage.
    #[must_use]
    pub fn with_statistics(mut self, statistics: UserStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Change the role, keeping the current area when none is supplied.
    pub fn with_role(mut self, role: Role, area: Option<Area>) -> Result<Self, UserValidationError> {
        let candidate = area.or_else(|| self.area.take());
        self.area = area_for_role(role, candidate)?;
        self.role = role;
        Ok(self)
    }

    /// Apply profile edits. Only volunteers may change their area.
    pub fn with_profile(mut self, changes: ProfileChanges) -> Result<Self, UserValidationError> {
        let ProfileChanges {
            name,
            email,
            profile_picture,
            password_hash,
            area,
        } = changes;

        if let Some(name) = name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(UserValidationError::EmptyName);
            }
            trimmed.clone_into(&mut self.name);
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(picture) = profile_picture {
            self.profile_picture = picture;
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        if let (Role::Volunteer, Some(area)) = (self.role, area) {
            self.area = Some(area);
        }
        Ok(self)
    }
}

/// Profile fields a user may edit on their own account.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<EmailAddress>,
    pub profile_picture: Option<String>,
    pub password_hash: Option<PasswordHash>,
    pub area: Option<Area>,
}

/// Display fields used when a user is referenced from another record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            name: user.name().to_owned(),
            email: user.email().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for user value types.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> UserDraft {
        UserDraft {
            id: UserId::random(),
            name: "  Rina Hart ".to_owned(),
            username: Username::new("rina").expect("username"),
            email: EmailAddress::new("Rina@Example.org").expect("email"),
            password_hash: PasswordHash::from_phc("$argon2id$stub"),
            role: Role::Informer,
            area: Some(Area::new("north").expect("area")),
            profile_picture: String::new(),
            is_active: true,
            last_login: None,
            statistics: UserStatistics::default(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn user_id_rejects_invalid_uuid() {
        assert_eq!(UserId::new("nope"), Err(UserValidationError::InvalidId));
        assert_eq!(UserId::new(""), Err(UserValidationError::EmptyId));
    }

    #[rstest]
    #[case("volunteer", Role::Volunteer)]
    #[case("teamLeader", Role::TeamLeader)]
    #[case("requestChecker", Role::RequestChecker)]
    #[case("receptionist", Role::Receptionist)]
    #[case("informer", Role::Informer)]
    #[case("admin", Role::Admin)]
    fn role_round_trips_wire_names(#[case] raw: &str, #[case] role: Role) {
        assert_eq!(raw.parse::<Role>(), Ok(role));
        assert_eq!(
            serde_json::to_value(role).expect("serialise role"),
            serde_json::json!(raw)
        );
    }

    #[rstest]
    fn admin_is_not_self_assignable() {
        assert!(!Role::Admin.is_self_assignable());
        assert!(Role::Informer.is_self_assignable());
    }

    #[rstest]
    #[case("  Someone@Example.COM ", Some("someone@example.com"))]
    #[case("no-at-sign", None)]
    #[case("a@b", None)]
    #[case("@example.com", None)]
    fn email_is_normalised(#[case] raw: &str, #[case] expected: Option<&str>) {
        let parsed = EmailAddress::new(raw).ok();
        assert_eq!(parsed.as_ref().map(EmailAddress::as_str), expected);
    }

    #[rstest]
    fn non_volunteer_area_is_dropped(draft: UserDraft) {
        let user = User::new(draft).expect("valid user");
        assert!(user.area().is_none());
        assert_eq!(user.name(), "Rina Hart");
    }

    #[rstest]
    fn volunteer_requires_area(mut draft: UserDraft) {
        draft.role = Role::Volunteer;
        draft.area = None;
        assert_eq!(
            User::new(draft).err(),
            Some(UserValidationError::AreaRequiredForVolunteer)
        );
    }

    #[rstest]
    fn switching_to_volunteer_needs_area(draft: UserDraft) {
        let user = User::new(draft).expect("valid user");
        let err = user
            .clone()
            .with_role(Role::Volunteer, None)
            .expect_err("area required");
        assert_eq!(err, UserValidationError::AreaRequiredForVolunteer);

        let promoted = user
            .with_role(Role::Volunteer, Some(Area::new("harbour").expect("area")))
            .expect("area supplied");
        assert_eq!(promoted.area().map(Area::as_str), Some("harbour"));
    }

    #[rstest]
    fn profile_area_only_changes_for_volunteers(draft: UserDraft) {
        let user = User::new(draft).expect("valid user");
        let edited = user
            .with_profile(ProfileChanges {
                area: Some(Area::new("south").expect("area")),
                ..ProfileChanges::default()
            })
            .expect("valid edit");
        assert!(edited.area().is_none());
    }
}
