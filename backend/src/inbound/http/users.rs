//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/users/register
//! POST /api/v1/login {"username":"rina","password":"secret1"}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! PUT  /api/v1/users/me
//! GET  /api/v1/users?role=volunteer&isActive=true
//! GET  /api/v1/users/{id}
//! PUT  /api/v1/users/{id}/role
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{ProfileEdit, Registration, UserFilter};
use crate::domain::{
    Area, EmailAddress, Error, LoginCredentials, LoginValidationError, Password, Role, User,
    UserId, UserStatistics, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, RoleSchema, UserStatisticsSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, missing_field_error, non_blank, parse_enum, parse_id,
};

const NAME: FieldName = FieldName::new("name");
const USERNAME: FieldName = FieldName::new("username");
const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const ROLE: FieldName = FieldName::new("role");
const AREA: FieldName = FieldName::new("area");
const USER_ID: FieldName = FieldName::new("id");

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Self-registration body. `area` is required for volunteers and ignored
/// otherwise.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(value_type = Option<RoleSchema>)]
    pub role: Option<String>,
    pub area: Option<String>,
}

/// Profile edits. Missing or blank fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub password: Option<String>,
    pub area: Option<String>,
}

/// Role change body for `PUT /api/v1/users/{id}/role`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    #[schema(value_type = RoleSchema)]
    pub role: String,
    pub area: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Only accounts with this role.
    #[param(value_type = Option<RoleSchema>)]
    pub role: Option<String>,
    /// Only active (`true`) or deactivated (`false`) accounts.
    pub is_active: Option<bool>,
}

/// Public account representation. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileBody {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[schema(value_type = RoleSchema)]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub profile_picture: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    #[schema(value_type = UserStatisticsSchema)]
    pub statistics: UserStatistics,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfileBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_owned(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            area: user.area().map(ToString::to_string),
            profile_picture: user.profile_picture().to_owned(),
            is_active: user.is_active(),
            last_login: user.last_login(),
            statistics: *user.statistics(),
            created_at: user.created_at(),
        }
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    non_blank(value).ok_or_else(|| missing_field_error(field))
}

fn parse_password(raw: &str) -> Result<Password, Error> {
    Password::new(raw).map_err(|err| field_error(PASSWORD, err.to_string()))
}

fn parse_area(raw: Option<String>) -> Result<Option<Area>, Error> {
    non_blank(raw)
        .map(|area| Area::new(area).map_err(|err| field_error(AREA, err.to_string())))
        .transpose()
}

fn parse_registration(payload: RegisterRequest) -> Result<Registration, Error> {
    let name = required(payload.name, NAME)?;
    let username = Username::new(required(payload.username, USERNAME)?)
        .map_err(|err| field_error(USERNAME, err.to_string()))?;
    let email = EmailAddress::new(required(payload.email, EMAIL)?)
        .map_err(|err| field_error(EMAIL, err.to_string()))?;
    let password = parse_password(&required(payload.password, PASSWORD)?)?;
    let role = parse_enum(&required(payload.role, ROLE)?, ROLE)?;
    let area = parse_area(payload.area)?;
    Ok(Registration {
        name,
        username,
        email,
        password,
        role,
        area,
    })
}

fn parse_profile_edit(payload: UpdateProfileRequest) -> Result<ProfileEdit, Error> {
    let email = non_blank(payload.email)
        .map(|raw| EmailAddress::new(raw).map_err(|err| field_error(EMAIL, err.to_string())))
        .transpose()?;
    let password = non_blank(payload.password)
        .map(|raw| parse_password(&raw))
        .transpose()?;
    Ok(ProfileEdit {
        name: non_blank(payload.name),
        email,
        profile_picture: non_blank(payload.profile_picture),
        password,
        area: parse_area(payload.area)?,
    })
}

fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    parse_id(raw, USER_ID, UserId::from_uuid)
}

/// Create an account and log it in.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfileBody,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Username or email taken", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = parse_registration(payload.into_inner())?;
    let user = state.accounts.register(registration).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(UserProfileBody::from(&user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserProfileBody,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    let user = state.accounts_query.profile(&user_id).await?;
    Ok(web::Json(UserProfileBody::from(&user)))
}

/// Forget the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Logged out")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(json!({ "message": "Logged out successfully" }))
}

/// The caller's own profile, statistics included.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = UserProfileBody),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfileBody>> {
    let actor = state.actor(&session).await?;
    let user = state.accounts_query.profile(&actor.id).await?;
    Ok(web::Json(UserProfileBody::from(&user)))
}

/// Edit the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfileBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Email taken", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[put("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let actor = state.actor(&session).await?;
    let edit = parse_profile_edit(payload.into_inner())?;
    let user = state.accounts.update_profile(&actor.id, edit).await?;
    Ok(web::Json(UserProfileBody::from(&user)))
}

/// List accounts. Admins and team leaders only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users", body = [UserProfileBody]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<Vec<UserProfileBody>>> {
    let actor = state.actor(&session).await?;
    let ListUsersQuery { role, is_active } = query.into_inner();
    let filter = UserFilter {
        role: non_blank(role).map(|raw| parse_enum(&raw, ROLE)).transpose()?,
        is_active,
    };
    let users = state.accounts_query.list_users(&actor, &filter).await?;
    Ok(web::Json(users.iter().map(UserProfileBody::from).collect()))
}

/// One account. Admins and team leaders only.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserProfileBody),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let actor = state.actor(&session).await?;
    let user_id = parse_user_id(&path.into_inner())?;
    let user = state.accounts_query.get_user(&actor, &user_id).await?;
    Ok(web::Json(UserProfileBody::from(&user)))
}

/// Change an account's role. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserProfileBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUserRole"
)]
#[put("/users/{id}/role")]
pub async fn update_user_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateRoleRequest>,
) -> ApiResult<web::Json<UserProfileBody>> {
    let actor = state.actor(&session).await?;
    let user_id = parse_user_id(&path.into_inner())?;
    let UpdateRoleRequest { role, area } = payload.into_inner();
    let role = parse_enum(&role, ROLE)?;
    let user = state
        .accounts
        .update_role(&actor, &user_id, role, parse_area(area)?)
        .await?;
    Ok(web::Json(UserProfileBody::from(&user)))
}

#[cfg(test)]
mod tests;
