//! Test utilities for the student records crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! with the `test-support` feature enabled.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{NewStudent, Student, StudentChanges, StudentId, StudentService};
use crate::inbound::http::state::HttpState;

#[derive(Default)]
struct Store {
    next_id: u64,
    records: Vec<Student>,
    failure: Option<StudentRepositoryError>,
}

/// Volatile [`StudentRepository`] that mirrors the document store contract.
///
/// Identifiers are 24-character hexadecimal counters, insertion order is
/// preserved, and the email uniqueness rule of the unique index is enforced.
#[derive(Default)]
pub struct InMemoryStudentRepository {
    store: Mutex<Store>,
}

impl InMemoryStudentRepository {
    /// Fixed creation timestamp stamped onto every inserted record.
    pub fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 21, 9, 17, 15)
            .single()
            .unwrap_or_default()
    }

    /// Make every subsequent call fail with `failure` until cleared.
    pub fn fail_with(&self, failure: Option<StudentRepositoryError>) {
        self.lock().failure = failure;
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the repository holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Store {
    fn check_failure(&self) -> Result<(), StudentRepositoryError> {
        self.failure.clone().map_or(Ok(()), Err)
    }

    fn email_taken(&self, email: &str, except: Option<&StudentId>) -> bool {
        self.records.iter().any(|record| {
            Some(record.id()) != except
                && record.email().is_some_and(|taken| taken.as_ref() == email)
        })
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError> {
        let mut store = self.lock();
        store.check_failure()?;
        if let Some(email) = &student.email {
            if store.email_taken(email.as_ref(), None) {
                return Err(StudentRepositoryError::duplicate_email(email.as_ref()));
            }
        }
        store.next_id += 1;
        let id = StudentId::new(format!("{:024x}", store.next_id))
            .map_err(|err| StudentRepositoryError::query(err.to_string()))?;
        let record = Student::from_new(id, Self::created_at(), student.clone());
        store.records.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let store = self.lock();
        store.check_failure()?;
        Ok(store.records.clone())
    }

    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError> {
        let store = self.lock();
        store.check_failure()?;
        Ok(store.records.iter().find(|record| record.id() == id).cloned())
    }

    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let mut store = self.lock();
        store.check_failure()?;
        if let Some(email) = &changes.email {
            if store.email_taken(email.as_ref(), Some(id)) {
                return Err(StudentRepositoryError::duplicate_email(email.as_ref()));
            }
        }
        Ok(store
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .map(|record| {
                changes.apply_to(record);
                record.clone()
            }))
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError> {
        let mut store = self.lock();
        store.check_failure()?;
        let before = store.records.len();
        store.records.retain(|record| record.id() != id);
        Ok(store.records.len() < before)
    }
}

/// Build HTTP state wired to a fresh in-memory repository.
///
/// The repository handle is returned so tests can inspect or sabotage it.
pub fn in_memory_state() -> (HttpState, Arc<InMemoryStudentRepository>) {
    let repository = Arc::new(InMemoryStudentRepository::default());
    let service = Arc::new(StudentService::new(repository.clone()));
    (HttpState::new(service.clone(), service), repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn new_student() -> NewStudent {
        NewStudent::try_from_parts(
            Some("Alice".to_owned()),
            Some(12),
            Some("6th".to_owned()),
            Some("alice@example.com".to_owned()),
        )
        .expect("fixture student")
    }

    #[rstest]
    #[tokio::test]
    async fn insert_assigns_hex_counter_ids(new_student: NewStudent) {
        let repository = InMemoryStudentRepository::default();
        let stored = repository.insert(&new_student).await.expect("insert");
        assert_eq!(stored.id().as_ref(), "000000000000000000000001");
    }

    #[rstest]
    #[tokio::test]
    async fn insert_rejects_duplicate_emails(new_student: NewStudent) {
        let repository = InMemoryStudentRepository::default();
        repository.insert(&new_student).await.expect("first insert");

        let result = repository.insert(&new_student).await;
        assert!(matches!(
            result,
            Err(StudentRepositoryError::DuplicateEmail { .. })
        ));
        assert_eq!(repository.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn scripted_failures_apply_to_every_call(new_student: NewStudent) {
        let repository = InMemoryStudentRepository::default();
        repository.fail_with(Some(StudentRepositoryError::connection("down")));

        assert!(repository.insert(&new_student).await.is_err());
        assert!(repository.list().await.is_err());

        repository.fail_with(None);
        assert!(repository.list().await.is_ok());
    }
}
