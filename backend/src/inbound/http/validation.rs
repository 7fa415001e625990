//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` [`Error`] whose `details`
//! object carries a machine-readable `code`.

use actix_web::{HttpRequest, web};
use actix_web::error::JsonPayloadError;
use serde_json::{Value, json};

use crate::domain::{Error, StudentId, StudentValidationError, StudentValidationErrors};

/// Validation error codes raised by the HTTP layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
    MalformedBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::MalformedBody => "malformed_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Field label used when a violation concerns the whole body.
const BODY_FIELD: &str = "body";

fn field_entry(error: &StudentValidationError) -> Value {
    json!({
        "field": error.field().unwrap_or(BODY_FIELD),
        "code": error.code(),
        "message": error.to_string(),
    })
}

/// Convert collected domain validation failures into a 400 response error.
pub(crate) fn student_validation_error(errors: &StudentValidationErrors) -> Error {
    let fields: Vec<Value> = errors.iter().map(field_entry).collect();
    Error::invalid_request(format!("validation failed: {errors}"))
        .with_details(json!({ "fields": fields }))
}

pub(crate) fn invalid_id_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!(
        "{field} must be a 24 character hexadecimal string"
    ))
    .with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidId.as_str(),
    }))
}

/// Parse a path segment into a [`StudentId`].
pub(crate) fn parse_student_id(value: &str, field: FieldName) -> Result<StudentId, Error> {
    StudentId::new(value).map_err(|_| invalid_id_error(field, value))
}

/// Error handler for the JSON extractor.
///
/// Turns syntax errors, wrong types, unknown fields and bad content types
/// into the standard error envelope instead of Actix's plain-text default.
pub(crate) fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let reason = err.to_string();
    Error::invalid_request("request body is not valid JSON for this endpoint")
        .with_details(json!({
            "code": ErrorCode::MalformedBody.as_str(),
            "reason": reason,
        }))
        .into()
}

/// JSON extractor configuration routing payload errors through
/// [`json_error_handler`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use student_records::inbound::http::validation::json_config;
///
/// let _app = App::new().app_data(json_config());
/// ```
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}
