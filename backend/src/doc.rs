//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP handler in the inbound layer together with
//! the schema wrappers for domain types, plus the session cookie security
//! scheme. Swagger UI serves it in debug builds.

use crate::inbound::http::notifications::{
    MarkReadRequest, NotificationBody, SendNotificationRequest, UnreadCountBody,
};
use crate::inbound::http::rescue_requests::{
    CreateRescueRequestBody, RescueRequestBody, UpdateRescueRequestBody,
};
use crate::inbound::http::schemas::{
    ErrorCodeSchema, ErrorSchema, RescueStatusSchema, RoleSchema, UserStatisticsSchema,
};
use crate::inbound::http::statistics::StatisticsBody;
use crate::inbound::http::users::{
    LoginRequest, RegisterRequest, UpdateProfileRequest, UpdateRoleRequest, UserProfileBody,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or registration.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "PawResQ backend API",
        description = "Animal rescue case management: accounts, rescue requests, \
                       notifications and volunteer statistics."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user_role,
        crate::inbound::http::rescue_requests::list_rescue_requests,
        crate::inbound::http::rescue_requests::get_rescue_request,
        crate::inbound::http::rescue_requests::create_rescue_request,
        crate::inbound::http::rescue_requests::update_rescue_request,
        crate::inbound::http::rescue_requests::delete_rescue_request,
        crate::inbound::http::statistics::my_statistics,
        crate::inbound::http::statistics::user_statistics,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::unread_count,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::send_notification,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RescueStatusSchema,
        RoleSchema,
        UserStatisticsSchema,
        LoginRequest,
        RegisterRequest,
        UpdateProfileRequest,
        UpdateRoleRequest,
        UserProfileBody,
        CreateRescueRequestBody,
        UpdateRescueRequestBody,
        RescueRequestBody,
        StatisticsBody,
        NotificationBody,
        SendNotificationRequest,
        MarkReadRequest,
        UnreadCountBody,
    )),
    tags(
        (name = "users", description = "Registration, login and profiles"),
        (name = "rescue-requests", description = "Rescue request lifecycle"),
        (name = "statistics", description = "Per-user rescue counters"),
        (name = "notifications", description = "User and role addressed notifications"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
