//! Rescue request HTTP handlers.
//!
//! ```text
//! GET    /api/v1/rescue-requests?status=pending&status=approved&informerId=..&assignedTo=..
//! GET    /api/v1/rescue-requests/{id}
//! POST   /api/v1/rescue-requests
//! PUT    /api/v1/rescue-requests/{id}
//! DELETE /api/v1/rescue-requests/{id}
//! ```
//!
//! Handlers only translate wire shapes. Transition checks, authorization and
//! the statistics side channel all live behind [`RescueRequestCommand`].
//!
//! [`RescueRequestCommand`]: crate::domain::ports::RescueRequestCommand

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    CreateRescueRequest, RescueRequestFilter, RescueRequestView, UpdateRescueRequest,
};
use crate::domain::{
    Coordinates, Error, RescueRequestChanges, RescueRequestId, RescueRequestValidationError,
    RescueStatus, UpdateEntry, UpdatesChange, UserId, UserSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, RescueStatusSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, non_blank, parse_enum, parse_id,
};

const ID: FieldName = FieldName::new("id");
const STATUS: FieldName = FieldName::new("status");
const INFORMER_ID: FieldName = FieldName::new("informerId");
const ASSIGNED_TO: FieldName = FieldName::new("assignedTo");
const UPDATES_MODE: FieldName = FieldName::new("updatesMode");

/// Latitude/longitude pair, stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct CoordinatesBody {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CoordinatesBody> for Coordinates {
    fn from(value: CoordinatesBody) -> Self {
        Self {
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

impl From<Coordinates> for CoordinatesBody {
    fn from(value: Coordinates) -> Self {
        Self {
            latitude: value.latitude,
            longitude: value.longitude,
        }
    }
}

/// Body for `POST /api/v1/rescue-requests`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRescueRequestBody {
    pub description: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub coordinates: Option<CoordinatesBody>,
}

/// One progress message. A `timestamp` sent by older clients is ignored;
/// the server stamps every entry.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateMessageBody {
    pub message: String,
}

/// Body for `PUT /api/v1/rescue-requests/{id}`. Every field is optional.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRescueRequestBody {
    pub description: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub coordinates: Option<CoordinatesBody>,
    #[schema(value_type = Option<RescueStatusSchema>)]
    pub status: Option<String>,
    /// Volunteer id; only valid together with `status: "assigned"`.
    pub assigned_to: Option<String>,
    pub updates: Option<Vec<UpdateMessageBody>>,
    /// `append` (default) or the legacy `replace`, which must resend the
    /// existing history as a prefix.
    #[schema(example = "append")]
    pub updates_mode: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListRescueRequestsQuery {
    /// Repeat or comma-separate to match any of several statuses.
    #[param(value_type = Option<Vec<RescueStatusSchema>>)]
    pub status: Option<Vec<String>>,
    pub informer_id: Option<String>,
    pub assigned_to: Option<String>,
}

/// A person referenced by a request. Name and email are absent when the
/// account no longer resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonBody {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PersonBody {
    fn resolve(id: &UserId, summary: Option<UserSummary>) -> Self {
        match summary {
            Some(summary) => Self {
                id: summary.id.to_string(),
                name: Some(summary.name),
                email: Some(summary.email),
            },
            None => Self {
                id: id.to_string(),
                name: None,
                email: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateEntryBody {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&UpdateEntry> for UpdateEntryBody {
    fn from(entry: &UpdateEntry) -> Self {
        Self {
            message: entry.message.clone(),
            timestamp: entry.timestamp,
        }
    }
}

/// Rescue request as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescueRequestBody {
    pub id: String,
    pub informer: PersonBody,
    pub description: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<CoordinatesBody>,
    #[schema(value_type = RescueStatusSchema)]
    pub status: RescueStatus,
    pub assigned_to: Option<PersonBody>,
    pub updates: Vec<UpdateEntryBody>,
    pub created_at: DateTime<Utc>,
}

impl From<RescueRequestView> for RescueRequestBody {
    fn from(view: RescueRequestView) -> Self {
        let RescueRequestView {
            request,
            informer,
            assigned_to,
        } = view;
        Self {
            id: request.id().to_string(),
            informer: PersonBody::resolve(request.informer(), informer),
            description: request.description().to_owned(),
            location: request.location().to_owned(),
            image_url: request.image_url().map(str::to_owned),
            coordinates: request.coordinates().map(CoordinatesBody::from),
            status: request.status(),
            assigned_to: request
                .assigned_to()
                .map(|id| PersonBody::resolve(id, assigned_to)),
            updates: request.updates().iter().map(UpdateEntryBody::from).collect(),
            created_at: request.created_at(),
        }
    }
}

fn parse_request_id(raw: &str) -> Result<RescueRequestId, Error> {
    parse_id(raw, ID, RescueRequestId::from_uuid)
}

fn parse_filter(query: ListRescueRequestsQuery) -> Result<RescueRequestFilter, Error> {
    let statuses = query
        .status
        .unwrap_or_default()
        .iter()
        .flat_map(|raw| raw.split(','))
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_enum(raw, STATUS))
        .collect::<Result<Vec<RescueStatus>, Error>>()?;
    let informer = non_blank(query.informer_id)
        .map(|raw| parse_id(&raw, INFORMER_ID, UserId::from_uuid))
        .transpose()?;
    let assigned_to = non_blank(query.assigned_to)
        .map(|raw| parse_id(&raw, ASSIGNED_TO, UserId::from_uuid))
        .transpose()?;
    Ok(RescueRequestFilter {
        statuses,
        informer,
        assigned_to,
    })
}

fn parse_updates(
    updates: Option<Vec<UpdateMessageBody>>,
    mode: Option<String>,
) -> Result<UpdatesChange, Error> {
    let Some(updates) = updates else {
        return Ok(UpdatesChange::Keep);
    };
    let messages = updates.into_iter().map(|entry| entry.message).collect();
    match non_blank(mode).as_deref().map(str::trim) {
        None | Some("append") => Ok(UpdatesChange::Append(messages)),
        Some("replace") => Ok(UpdatesChange::Replace(messages)),
        Some(other) => Err(invalid_value_error(
            UPDATES_MODE,
            other,
            "updatesMode must be append or replace",
        )),
    }
}

fn parse_changes(body: UpdateRescueRequestBody) -> Result<RescueRequestChanges, Error> {
    let UpdateRescueRequestBody {
        description,
        location,
        image_url,
        coordinates,
        status,
        assigned_to,
        updates,
        updates_mode,
    } = body;
    Ok(RescueRequestChanges {
        description,
        location,
        image_url,
        coordinates: coordinates.map(Coordinates::from),
        status: non_blank(status)
            .map(|raw| parse_enum(&raw, STATUS))
            .transpose()?,
        assigned_to: non_blank(assigned_to)
            .map(|raw| parse_id(&raw, ASSIGNED_TO, UserId::from_uuid))
            .transpose()?,
        updates: parse_updates(updates, updates_mode)?,
    })
}

/// List rescue requests, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/rescue-requests",
    params(ListRescueRequestsQuery),
    responses(
        (status = 200, description = "Matching requests", body = [RescueRequestBody]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["rescue-requests"],
    operation_id = "listRescueRequests"
)]
#[get("/rescue-requests")]
pub async fn list_rescue_requests(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<Vec<(String, String)>>,
) -> ApiResult<web::Json<Vec<RescueRequestBody>>> {
    state.actor(&session).await?;
    let filter = parse_filter(collect_list_query(query.into_inner()))?;
    let views = state.rescue_requests_query.list(&filter).await?;
    Ok(web::Json(views.into_iter().map(RescueRequestBody::from).collect()))
}

/// `serde_urlencoded` cannot gather repeated keys into a `Vec`, so the raw
/// pairs are folded by hand. Unknown keys are ignored.
fn collect_list_query(pairs: Vec<(String, String)>) -> ListRescueRequestsQuery {
    let mut query = ListRescueRequestsQuery {
        status: None,
        informer_id: None,
        assigned_to: None,
    };
    for (key, value) in pairs {
        match key.as_str() {
            "status" => query.status.get_or_insert_with(Vec::new).push(value),
            "informerId" => query.informer_id = Some(value),
            "assignedTo" => query.assigned_to = Some(value),
            _ => {}
        }
    }
    query
}

/// Fetch one rescue request.
#[utoipa::path(
    get,
    path = "/api/v1/rescue-requests/{id}",
    params(("id" = String, Path, description = "Rescue request id")),
    responses(
        (status = 200, description = "Rescue request", body = RescueRequestBody),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["rescue-requests"],
    operation_id = "getRescueRequest"
)]
#[get("/rescue-requests/{id}")]
pub async fn get_rescue_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RescueRequestBody>> {
    state.actor(&session).await?;
    let id = parse_request_id(&path.into_inner())?;
    let view = state.rescue_requests_query.get(&id).await?;
    Ok(web::Json(RescueRequestBody::from(view)))
}

/// File a new rescue request as the logged-in user.
#[utoipa::path(
    post,
    path = "/api/v1/rescue-requests",
    request_body = CreateRescueRequestBody,
    responses(
        (status = 201, description = "Created", body = RescueRequestBody),
        (status = 400, description = "Description and location are required", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["rescue-requests"],
    operation_id = "createRescueRequest"
)]
#[post("/rescue-requests")]
pub async fn create_rescue_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRescueRequestBody>,
) -> ApiResult<HttpResponse> {
    let actor = state.actor(&session).await?;
    let CreateRescueRequestBody {
        description,
        location,
        image_url,
        coordinates,
    } = payload.into_inner();
    let (Some(description), Some(location)) = (non_blank(description), non_blank(location)) else {
        return Err(RescueRequestValidationError::MissingDescriptionOrLocation.into());
    };

    let view = state
        .rescue_requests
        .create(CreateRescueRequest {
            actor,
            description,
            location,
            image_url,
            coordinates: coordinates.map(Coordinates::from),
        })
        .await?;
    Ok(HttpResponse::Created().json(RescueRequestBody::from(view)))
}

/// Apply a partial update, including status transitions.
#[utoipa::path(
    put,
    path = "/api/v1/rescue-requests/{id}",
    params(("id" = String, Path, description = "Rescue request id")),
    request_body = UpdateRescueRequestBody,
    responses(
        (status = 200, description = "Updated request", body = RescueRequestBody),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["rescue-requests"],
    operation_id = "updateRescueRequest"
)]
#[put("/rescue-requests/{id}")]
pub async fn update_rescue_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateRescueRequestBody>,
) -> ApiResult<web::Json<RescueRequestBody>> {
    let actor = state.actor(&session).await?;
    let id = parse_request_id(&path.into_inner())?;
    let changes = parse_changes(payload.into_inner())?;
    let view = state
        .rescue_requests
        .update(UpdateRescueRequest { actor, id, changes })
        .await?;
    Ok(web::Json(RescueRequestBody::from(view)))
}

/// Delete a rescue request.
#[utoipa::path(
    delete,
    path = "/api/v1/rescue-requests/{id}",
    params(("id" = String, Path, description = "Rescue request id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["rescue-requests"],
    operation_id = "deleteRescueRequest"
)]
#[delete("/rescue-requests/{id}")]
pub async fn delete_rescue_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = state.actor(&session).await?;
    let id = parse_request_id(&path.into_inner())?;
    state.rescue_requests.delete(&actor, &id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Rescue request deleted successfully" })))
}
