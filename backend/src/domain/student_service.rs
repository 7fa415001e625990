//! Student domain service.
//!
//! Implements the driving ports on top of a [`StudentRepository`]. Every
//! use-case performs exactly one repository call and translates port errors
//! into domain [`Error`]s.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::ports::{
    StudentRepository, StudentRepositoryError, StudentsCommand, StudentsQuery,
};
use crate::domain::{Error, NewStudent, Student, StudentChanges, StudentId};

/// Student service implementing [`StudentsCommand`] and [`StudentsQuery`].
#[derive(Clone)]
pub struct StudentService<R> {
    repository: Arc<R>,
}

impl<R> StudentService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

fn map_repository_error(error: StudentRepositoryError) -> Error {
    match error {
        StudentRepositoryError::Connection { message } => {
            error!(%message, "student repository unavailable");
            Error::internal(format!("student repository unavailable: {message}"))
        }
        StudentRepositoryError::Query { message } => {
            error!(%message, "student repository query failed");
            Error::internal(format!("student repository error: {message}"))
        }
        StudentRepositoryError::DuplicateEmail { email } => {
            warn!(%email, "rejected duplicate student email");
            Error::conflict("a student with this email already exists").with_details(json!({
                "field": "email",
                "value": email,
                "code": "duplicate_email",
            }))
        }
    }
}

fn student_not_found(id: &StudentId) -> Error {
    Error::not_found("student not found").with_details(json!({ "id": id.as_ref() }))
}

#[async_trait]
impl<R> StudentsCommand for StudentService<R>
where
    R: StudentRepository,
{
    async fn create(&self, student: NewStudent) -> Result<Student, Error> {
        self.repository
            .insert(&student)
            .await
            .map_err(map_repository_error)
    }

    async fn update(&self, id: &StudentId, changes: StudentChanges) -> Result<Student, Error> {
        self.repository
            .update(id, &changes)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| student_not_found(id))
    }

    async fn delete(&self, id: &StudentId) -> Result<(), Error> {
        let deleted = self
            .repository
            .delete(id)
            .await
            .map_err(map_repository_error)?;
        if deleted {
            Ok(())
        } else {
            Err(student_not_found(id))
        }
    }
}

#[async_trait]
impl<R> StudentsQuery for StudentService<R>
where
    R: StudentRepository,
{
    async fn list(&self) -> Result<Vec<Student>, Error> {
        self.repository.list().await.map_err(map_repository_error)
    }

    async fn get(&self, id: &StudentId) -> Result<Student, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| student_not_found(id))
    }
}
