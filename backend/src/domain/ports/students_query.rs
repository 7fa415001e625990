//! Driving port for student reads.

use async_trait::async_trait;

use crate::domain::{Error, Student, StudentId};

/// Domain use-case port for reading students.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentsQuery: Send + Sync {
    /// Return every student in natural storage order.
    async fn list(&self) -> Result<Vec<Student>, Error>;

    /// Fetch one student, failing with `not_found` for unknown ids.
    async fn get(&self, id: &StudentId) -> Result<Student, Error>;
}
