//! Port for student record persistence.
//!
//! The [`StudentRepository`] trait is the single seam between the domain and
//! the document store. Each method maps to exactly one driver call; adapters
//! must not compose queries, cache results, or retry on failure.

use async_trait::async_trait;

use crate::domain::{NewStudent, Student, StudentChanges, StudentId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by student repository adapters.
    pub enum StudentRepositoryError {
        /// The document store could not be reached.
        Connection { message: String } =>
            "student repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "student repository query failed: {message}",
        /// The unique email index rejected the write.
        DuplicateEmail { email: String } =>
            "a student with email {email} already exists",
    }
}

/// Port for student storage and retrieval.
///
/// Not-found is not an error: lookups return `None`, updates return `None`,
/// and deletions return `false` when no record matches the identifier.
///
/// A stored record that can no longer be read as a valid [`Student`] is never
/// skipped: any read touching it fails with
/// [`StudentRepositoryError::Query`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Insert a new record, assigning its identifier and creation time.
    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError>;

    /// Return every record in natural storage order.
    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError>;

    /// Fetch one record by identifier.
    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError>;

    /// Apply `changes` to the matching record and return the updated state.
    ///
    /// Must never create a record when `id` is unknown.
    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError>;

    /// Remove the matching record, reporting whether one existed.
    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError>;
}
