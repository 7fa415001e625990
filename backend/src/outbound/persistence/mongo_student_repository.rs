//! MongoDB-backed `StudentRepository` implementation.
//!
//! Each port method issues exactly one driver call against the `students`
//! collection. Email uniqueness is enforced by a sparse unique index so that
//! duplicate writes surface as driver error code 11000. A stored document
//! that fails to decode or validate fails the whole read as a query error.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, IndexModel};
use tracing::{debug, warn};

use crate::domain::ports::{StudentRepository, StudentRepositoryError};
use crate::domain::{NewStudent, Student, StudentChanges, StudentId};

use super::client::StoreClient;
use super::documents::{DocumentError, StudentDocument, object_id, set_document};

const DUPLICATE_KEY: i32 = 11000;
const EMAIL_INDEX: &str = "email_unique";

/// Driver-backed implementation of the [`StudentRepository`] port.
#[derive(Clone, Debug)]
pub struct MongoStudentRepository {
    collection: Collection<StudentDocument>,
}

impl MongoStudentRepository {
    /// Create a repository over the students collection of `store`.
    pub fn new(store: &StoreClient) -> Self {
        Self {
            collection: store.students(),
        }
    }

    /// Create the sparse unique index on `email` if it is missing.
    ///
    /// Records without an email are not indexed, so any number of them may
    /// coexist.
    pub async fn ensure_indexes(&self) -> Result<(), StudentRepositoryError> {
        let options = IndexOptions::builder()
            .name(EMAIL_INDEX.to_owned())
            .unique(true)
            .sparse(true)
            .build();
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(options)
            .build();
        self.collection
            .create_index(index)
            .await
            .map(|_| ())
            .map_err(|err| map_mongo_error(err, None))
    }
}

fn is_duplicate_key(error: &MongoError) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Map driver errors to repository errors.
///
/// `email` is the address being written, if any, and is reported back when
/// the unique index rejects it.
fn map_mongo_error(error: MongoError, email: Option<&str>) -> StudentRepositoryError {
    debug!(error = %error, "mongodb operation failed");

    if is_duplicate_key(&error) {
        return StudentRepositoryError::duplicate_email(email.unwrap_or_default());
    }

    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            StudentRepositoryError::connection("document store unreachable")
        }
        _ => StudentRepositoryError::query("document store error"),
    }
}

fn map_document_error(error: DocumentError) -> StudentRepositoryError {
    StudentRepositoryError::query(format!("stored student is invalid: {error}"))
}

fn into_students(
    documents: Vec<StudentDocument>,
) -> Result<Vec<Student>, StudentRepositoryError> {
    documents
        .into_iter()
        .map(|document| {
            let id = document.id;
            document
                .into_student()
                .inspect_err(|err| warn!(%id, error = %err, "invalid student document"))
        })
        .collect::<Result<_, _>>()
        .map_err(map_document_error)
}

fn map_id_error(id: &StudentId) -> StudentRepositoryError {
    StudentRepositoryError::query(format!("identifier {id} is not a valid object id"))
}

#[async_trait]
impl StudentRepository for MongoStudentRepository {
    async fn insert(&self, student: &NewStudent) -> Result<Student, StudentRepositoryError> {
        let document = StudentDocument::for_insert(student);
        let email = student.email.as_ref().map(AsRef::as_ref);
        self.collection
            .insert_one(&document)
            .await
            .map_err(|err| map_mongo_error(err, email))?;
        document.into_student().map_err(map_document_error)
    }

    async fn list(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let documents: Vec<StudentDocument> = self
            .collection
            .find(doc! {})
            .await
            .map_err(|err| map_mongo_error(err, None))?
            .try_collect()
            .await
            .map_err(|err| map_mongo_error(err, None))?;
        into_students(documents)
    }

    async fn find_by_id(&self, id: &StudentId) -> Result<Option<Student>, StudentRepositoryError> {
        let oid = object_id(id).map_err(|_| map_id_error(id))?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|err| map_mongo_error(err, None))?
            .map(StudentDocument::into_student)
            .transpose()
            .map_err(map_document_error)
    }

    async fn update(
        &self,
        id: &StudentId,
        changes: &StudentChanges,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let oid = object_id(id).map_err(|_| map_id_error(id))?;
        let email = changes.email.as_ref().map(AsRef::as_ref);
        self.collection
            .find_one_and_update(doc! { "_id": oid }, set_document(changes))
            .return_document(ReturnDocument::After)
            .await
            .map_err(|err| map_mongo_error(err, email))?
            .map(StudentDocument::into_student)
            .transpose()
            .map_err(map_document_error)
    }

    async fn delete(&self, id: &StudentId) -> Result<bool, StudentRepositoryError> {
        let oid = object_id(id).map_err(|_| map_id_error(id))?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|err| map_mongo_error(err, None))?;
        Ok(result.deleted_count > 0)
    }
}
