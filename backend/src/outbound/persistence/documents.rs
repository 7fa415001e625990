//! Internal BSON document structs for the students collection.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Field names match the stored layout:
//! `_id` holds the driver-generated `ObjectId` and timestamps are BSON dates.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Age, Email, Grade, NewStudent, Student, StudentChanges, StudentId, StudentName,
    StudentValidationError,
};

/// Stored representation of a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StudentDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age: i32,
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: bson::DateTime,
}

/// Reasons a stored document cannot be lifted into a domain [`Student`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DocumentError {
    #[error("stored field is invalid: {0}")]
    Field(#[from] StudentValidationError),
    #[error("stored creation time {millis} is out of range")]
    CreatedAt { millis: i64 },
}

impl StudentDocument {
    /// Build a fresh document for insertion with a new id and creation time.
    pub fn for_insert(student: &NewStudent) -> Self {
        Self {
            id: ObjectId::new(),
            name: student.name.as_ref().to_owned(),
            age: i32::from(student.age.years()),
            grade: student.grade.as_ref().to_owned(),
            email: student.email.as_ref().map(|email| email.as_ref().to_owned()),
            created_at: bson::DateTime::now(),
        }
    }

    /// Convert the stored document into a validated domain record.
    pub fn into_student(self) -> Result<Student, DocumentError> {
        let id = StudentId::new(self.id.to_hex())?;
        let millis = self.created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or(DocumentError::CreatedAt { millis })?;
        let fields = NewStudent {
            name: StudentName::new(self.name)?,
            age: Age::new(i64::from(self.age))?,
            grade: Grade::new(self.grade)?,
            email: self.email.map(Email::new).transpose()?,
        };
        Ok(Student::from_new(id, created_at, fields))
    }
}

/// Parse a validated identifier into the driver's `ObjectId`.
pub(crate) fn object_id(id: &StudentId) -> Result<ObjectId, bson::oid::Error> {
    ObjectId::parse_str(id.as_ref())
}

/// Build a `$set` update touching only the provided fields.
pub(crate) fn set_document(changes: &StudentChanges) -> Document {
    let mut set = Document::new();
    if let Some(name) = &changes.name {
        set.insert("name", name.as_ref());
    }
    if let Some(age) = changes.age {
        set.insert("age", i32::from(age.years()));
    }
    if let Some(grade) = &changes.grade {
        set.insert("grade", grade.as_ref());
    }
    if let Some(email) = &changes.email {
        set.insert("email", email.as_ref());
    }
    doc! { "$set": set }
}
