//! Notification HTTP handlers.
//!
//! ```text
//! GET  /api/v1/notifications?unreadOnly=true
//! GET  /api/v1/notifications/unread/count
//! PUT  /api/v1/notifications/mark-read
//! POST /api/v1/notifications
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{NotificationView, RescueRequestDigest};
use crate::domain::{
    Error, NewNotification, NotificationId, NotificationTarget, RescueRequestId, RescueStatus,
    Role, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, RescueStatusSchema, RoleSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, missing_field_error, non_blank, parse_enum, parse_id, parse_id_list,
};

const TYPE: FieldName = FieldName::new("type");
const CONTENT: FieldName = FieldName::new("content");
const TARGET_ID: FieldName = FieldName::new("targetId");
const TARGET_ROLE: FieldName = FieldName::new("targetRole");
const RESCUE_REQUEST_ID: FieldName = FieldName::new("rescueRequestId");
const NOTIFICATION_IDS: FieldName = FieldName::new("notificationIds");

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// Body for `PUT /api/v1/notifications/mark-read`. Omit or empty the list to
/// mark everything.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Option<Vec<String>>,
}

/// Body for `POST /api/v1/notifications`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub target_id: Option<String>,
    #[schema(value_type = Option<RoleSchema>)]
    pub target_role: Option<String>,
    pub content: Option<String>,
    pub rescue_request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RescueRequestDigestBody {
    pub description: String,
    pub location: String,
    #[schema(value_type = RescueStatusSchema)]
    pub status: RescueStatus,
}

impl From<RescueRequestDigest> for RescueRequestDigestBody {
    fn from(value: RescueRequestDigest) -> Self {
        Self {
            description: value.description,
            location: value.location,
            status: value.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBody {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<RoleSchema>)]
    pub target_role: Option<Role>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescue_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescue_request: Option<RescueRequestDigestBody>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationView> for NotificationBody {
    fn from(view: NotificationView) -> Self {
        let NotificationView {
            notification,
            rescue_request,
        } = view;
        let target = notification.target();
        Self {
            id: notification.id().to_string(),
            kind: notification.kind().to_owned(),
            target_id: target.user_id().map(ToString::to_string),
            target_role: target.target_role(),
            content: notification.content().to_owned(),
            rescue_request_id: notification.rescue_request_id().map(|id| id.to_string()),
            rescue_request: rescue_request.map(RescueRequestDigestBody::from),
            is_read: notification.is_read(),
            created_at: notification.created_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountBody {
    pub count: u64,
}

fn parse_send_request(body: SendNotificationRequest) -> Result<NewNotification, Error> {
    let kind = non_blank(body.kind).ok_or_else(|| missing_field_error(TYPE))?;
    let content = non_blank(body.content).ok_or_else(|| missing_field_error(CONTENT))?;
    let user = non_blank(body.target_id)
        .map(|raw| parse_id(&raw, TARGET_ID, UserId::from_uuid))
        .transpose()?;
    let role = non_blank(body.target_role)
        .map(|raw| parse_enum::<Role>(&raw, TARGET_ROLE))
        .transpose()?;
    let target = NotificationTarget::new(user, role)
        .map_err(|err| field_error(TARGET_ID, err.to_string()))?;
    let rescue_request_id = non_blank(body.rescue_request_id)
        .map(|raw| parse_id(&raw, RESCUE_REQUEST_ID, RescueRequestId::from_uuid))
        .transpose()?;
    Ok(NewNotification {
        kind,
        target,
        content,
        rescue_request_id,
    })
}

/// Notifications addressed to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "Notifications", body = [NotificationBody]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListNotificationsQuery>,
) -> ApiResult<web::Json<Vec<NotificationBody>>> {
    let actor = state.actor(&session).await?;
    let views = state
        .notifications_query
        .list(&actor, query.unread_only)
        .await?;
    Ok(web::Json(views.into_iter().map(NotificationBody::from).collect()))
}

/// Number of unread notifications for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread/count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountBody),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "countUnreadNotifications"
)]
#[get("/notifications/unread/count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UnreadCountBody>> {
    let actor = state.actor(&session).await?;
    let count = state.notifications_query.unread_count(&actor).await?;
    Ok(web::Json(UnreadCountBody { count }))
}

/// Mark notifications as read.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/mark-read",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Marked as read"),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationsRead"
)]
#[put("/notifications/mark-read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: Option<web::Json<MarkReadRequest>>,
) -> ApiResult<HttpResponse> {
    let actor = state.actor(&session).await?;
    let ids = payload
        .and_then(|body| body.into_inner().notification_ids)
        .filter(|ids| !ids.is_empty());
    let ids = ids
        .map(|ids| parse_id_list(&ids, NOTIFICATION_IDS, NotificationId::from_uuid))
        .transpose()?;
    state.notifications.mark_read(&actor, ids).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Notifications marked as read" })))
}

/// Send a notification to a user or a role.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Stored", body = NotificationBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications")]
pub async fn send_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendNotificationRequest>,
) -> ApiResult<HttpResponse> {
    state.actor(&session).await?;
    let notification = parse_send_request(payload.into_inner())?;
    let stored = state.notifications.send(notification).await?;
    let body = NotificationBody::from(NotificationView {
        notification: stored,
        rescue_request: None,
    });
    Ok(HttpResponse::Created().json(body))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::service_test_support::{actor_for, fixture_timestamp, user_with_role};
    use crate::domain::{NEW_RESCUE_REQUEST, Notification};
    use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_app};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(list_notifications)
            .service(unread_count)
            .service(mark_read)
            .service(send_notification);
    }

    fn role_notification(request: RescueRequestId) -> Notification {
        Notification::new(
            NewNotification {
                kind: NEW_RESCUE_REQUEST.to_owned(),
                target: NotificationTarget::role(Role::RequestChecker),
                content: "A new rescue request needs review".to_owned(),
                rescue_request_id: Some(request),
            },
            fixture_timestamp(),
        )
        .expect("valid notification")
    }

    #[actix_web::test]
    async fn list_attaches_the_request_digest() {
        let checker = user_with_role(Role::RequestChecker);
        let mut ports = MockPorts::default().acting_as(&actor_for(&checker));
        let notification = role_notification(RescueRequestId::random());
        ports
            .notifications_query
            .expect_list()
            .withf(|_, unread_only| *unread_only)
            .times(1)
            .returning(move |_, _| {
                Ok(vec![NotificationView {
                    notification: notification.clone(),
                    rescue_request: Some(RescueRequestDigest {
                        description: "Dog limping".to_owned(),
                        location: "Mill Lane".to_owned(),
                        status: RescueStatus::Pending,
                    }),
                }])
            });
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, checker.id()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/notifications?unreadOnly=true")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value[0]["type"], NEW_RESCUE_REQUEST);
        assert_eq!(value[0]["targetRole"], "requestChecker");
        assert_eq!(value[0]["rescueRequest"]["status"], "pending");
        assert_eq!(value[0]["isRead"], false);
        assert!(value[0].get("targetId").is_none());
    }

    #[actix_web::test]
    async fn unread_count_is_wrapped() {
        let volunteer = user_with_role(Role::Volunteer);
        let mut ports = MockPorts::default().acting_as(&actor_for(&volunteer));
        ports
            .notifications_query
            .expect_unread_count()
            .returning(|_| Ok(3));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, volunteer.id()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/notifications/unread/count")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value, json!({"count": 3}));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"notificationIds": []}))]
    #[actix_web::test]
    async fn mark_read_without_ids_marks_everything(#[case] body: Value) {
        let volunteer = user_with_role(Role::Volunteer);
        let mut ports = MockPorts::default().acting_as(&actor_for(&volunteer));
        ports
            .notifications
            .expect_mark_read()
            .withf(|_, ids| ids.is_none())
            .times(1)
            .returning(|_, _| Ok(2));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, volunteer.id()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v1/notifications/mark-read")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["message"], "Notifications marked as read");
    }

    #[actix_web::test]
    async fn mark_read_rejects_malformed_ids() {
        let volunteer = user_with_role(Role::Volunteer);
        let ports = MockPorts::default().acting_as(&actor_for(&volunteer));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, volunteer.id()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v1/notifications/mark-read")
                .cookie(cookie)
                .set_json(json!({"notificationIds": ["nope"]}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["details"]["index"], 0);
    }

    #[actix_web::test]
    async fn send_stores_a_role_notification() {
        let admin = user_with_role(Role::Admin);
        let mut ports = MockPorts::default().acting_as(&actor_for(&admin));
        ports
            .notifications
            .expect_send()
            .withf(|input| {
                input.kind == "ANNOUNCEMENT"
                    && input.target.target_role() == Some(Role::Volunteer)
                    && input.target.user_id().is_none()
            })
            .times(1)
            .returning(|input| Ok(Notification::new(input, fixture_timestamp()).expect("valid")));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, admin.id()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/notifications")
                .cookie(cookie)
                .set_json(json!({
                    "type": "ANNOUNCEMENT",
                    "targetRole": "volunteer",
                    "content": "Training on Saturday",
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["targetRole"], "volunteer");
    }

    #[rstest]
    #[case(json!({"content": "hi", "targetRole": "admin"}), "type")]
    #[case(json!({"type": "PING", "targetRole": "admin"}), "content")]
    #[case(json!({"type": "PING", "content": "hi"}), "targetId")]
    fn send_requires_type_content_and_a_target(#[case] body: Value, #[case] field: &str) {
        let request: SendNotificationRequest = serde_json::from_value(body).expect("valid json");
        let err = parse_send_request(request).expect_err("incomplete request");
        assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!(field)));
    }
}
