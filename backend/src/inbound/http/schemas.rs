//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

use chrono::{DateTime, Utc};
use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with existing state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The client exceeded its request quota.
    #[schema(rename = "too_many_requests")]
    TooManyRequests,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "validation failed: age must be between 1 and 149")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients, such as offending fields.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::Student`].
///
/// Stored student record. `email` is omitted when the record has none.
#[derive(ToSchema)]
#[schema(as = Student, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct StudentSchema {
    /// Store-assigned identifier, 24 hexadecimal characters.
    #[schema(example = "682d9a1b7943cd79b2fae99d")]
    id: String,
    /// Full name.
    #[schema(example = "Alice")]
    name: String,
    /// Age in years.
    #[schema(example = 12, minimum = 1, maximum = 149)]
    age: u8,
    /// Grade label.
    #[schema(example = "6th")]
    grade: String,
    /// Unique contact address.
    #[schema(example = "alice@example.com")]
    email: Option<String>,
    /// Moment the record was first stored.
    created_at: DateTime<Utc>,
}
