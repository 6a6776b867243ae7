//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` name the
//! offending field in its wire spelling, plus a machine-readable `code`.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Detail codes attached to validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// Wire name of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// A field that failed a domain rule. The value is not echoed, so this is
/// safe for secrets.
pub(crate) fn field_error(field: FieldName, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": ErrorCode::InvalidValue.as_str(),
    }))
}

/// A value outside the accepted set, e.g. an unknown role or status.
pub(crate) fn invalid_value_error(field: FieldName, value: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": ErrorCode::InvalidValue.as_str(),
    }))
}

/// Parse a UUID-backed identifier.
pub(crate) fn parse_id<T>(value: &str, field: FieldName, wrap: impl FnOnce(Uuid) -> T) -> Result<T, Error> {
    Uuid::parse_str(value.trim())
        .map(wrap)
        .map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a list of UUID-backed identifiers, reporting the first bad index.
pub(crate) fn parse_id_list<T>(
    values: &[String],
    field: FieldName,
    wrap: impl Fn(Uuid) -> T,
) -> Result<Vec<T>, Error> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Uuid::parse_str(value.trim()).map(&wrap).map_err(|_| {
                Error::invalid_request(format!("{} must contain valid UUIDs", field.as_str()))
                    .with_details(json!({
                        "field": field.as_str(),
                        "index": index,
                        "value": value,
                        "code": ErrorCode::InvalidUuid.as_str(),
                    }))
            })
        })
        .collect()
}

/// Parse an enumerated value with its `FromStr` impl.
pub(crate) fn parse_enum<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_value_error(field, value, format!("unknown {}: {value}", field.as_str())))
}

/// Treat missing and whitespace-only text the same way.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{ErrorCode as DomainCode, RescueRequestId, RescueStatus, Role};

    const STATUS: FieldName = FieldName::new("status");

    #[rstest]
    fn missing_field_names_the_field() {
        let err = missing_field_error(FieldName::new("location"));
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(err.message(), "missing required field: location");
        assert_eq!(
            err.details(),
            Some(&json!({"field": "location", "code": "missing_field"}))
        );
    }

    #[rstest]
    fn parse_id_reports_the_raw_value() {
        let err = parse_id("nope", FieldName::new("id"), RescueRequestId::from_uuid)
            .expect_err("not a uuid");
        assert_eq!(err.details().and_then(|d| d.get("value")), Some(&json!("nope")));
    }

    #[rstest]
    fn parse_id_list_reports_the_failing_index() {
        let values = vec![Uuid::new_v4().to_string(), "bad".to_owned()];
        let err = parse_id_list(&values, FieldName::new("notificationIds"), RescueRequestId::from_uuid)
            .expect_err("second id is invalid");
        assert_eq!(err.details().and_then(|d| d.get("index")), Some(&json!(1)));
    }

    #[rstest]
    #[case("in-progress", Some(RescueStatus::InProgress))]
    #[case(" completed ", Some(RescueStatus::Completed))]
    #[case("done", None)]
    fn parse_enum_uses_wire_spelling(#[case] raw: &str, #[case] expected: Option<RescueStatus>) {
        assert_eq!(parse_enum::<RescueStatus>(raw, STATUS).ok(), expected);
    }

    #[rstest]
    fn parse_enum_rejects_unknown_roles() {
        let err = parse_enum::<Role>("superuser", FieldName::new("role")).expect_err("unknown role");
        assert_eq!(err.message(), "unknown role: superuser");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("   "), None)]
    #[case(Some("Ana"), Some("Ana"))]
    fn non_blank_drops_whitespace(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(non_blank(raw.map(str::to_owned)).as_deref(), expected);
    }
}
