//! Domain primitives, ports and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers. Keep types free of transport and driver concerns and
//! document invariants and serialisation contracts (serde) in each type's
//! Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Student and its field newtypes: the single persisted entity.
//! - StudentService: use-cases implementing the driving ports.
//! - TraceId: request correlation identifier.

pub mod error;
pub mod ports;
pub mod student;
pub mod student_service;
pub mod trace_id;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::student::{
    Age, Email, Grade, NewStudent, Student, StudentChanges, StudentId, StudentName,
    StudentValidationError, StudentValidationErrors,
};
pub use self::student_service::StudentService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
