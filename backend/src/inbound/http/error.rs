//! Domain errors as HTTP responses.
//!
//! `invalid_request` and `invalid_transition` both surface as 400; the body's
//! `code` tells them apart. Server-side failures are logged with their real
//! message, then redacted before they reach the client.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::InvalidTransition => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The payload actually sent. Internal errors keep only their trace id.
fn wire_payload(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    match error.trace_id() {
        Some(id) => Error::internal(REDACTED_MESSAGE).with_trace_id(id.to_owned()),
        None => Error::internal(REDACTED_MESSAGE),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let trace_id = self.trace_id().unwrap_or("-");
        match self.code() {
            ErrorCode::InternalError => {
                error!(%trace_id, message = self.message(), "request failed");
            }
            ErrorCode::ServiceUnavailable => {
                warn!(%trace_id, message = self.message(), "backing store unavailable");
            }
            _ => {}
        }

        let mut builder = HttpResponse::build(status);
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(wire_payload(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error promoted to domain error");
        Error::internal(REDACTED_MESSAGE)
    }
}
