//! Driving port for student mutations.
//!
//! Inbound adapters call this port with already-validated domain values and
//! receive domain [`Error`]s that they translate into transport responses.

use async_trait::async_trait;

use crate::domain::{Error, NewStudent, Student, StudentChanges, StudentId};

/// Domain use-case port for creating, updating and deleting students.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentsCommand: Send + Sync {
    /// Store a new student and return it with its generated identifier.
    async fn create(&self, student: NewStudent) -> Result<Student, Error>;

    /// Apply a partial update, failing with `not_found` for unknown ids.
    async fn update(&self, id: &StudentId, changes: StudentChanges) -> Result<Student, Error>;

    /// Remove a student, failing with `not_found` for unknown ids.
    async fn delete(&self, id: &StudentId) -> Result<(), Error>;
}
