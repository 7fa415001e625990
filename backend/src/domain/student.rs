//! Student data model.
//!
//! Every field is a validated newtype so adapters cannot build a [`Student`]
//! that violates the schema. Request payloads are converted through
//! [`NewStudent::try_from_parts`] and [`StudentChanges::try_from_parts`], which
//! report every violated field at once rather than stopping at the first.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum allowed length for a student name.
pub const NAME_MIN: usize = 2;
/// Maximum allowed length for a student name.
pub const NAME_MAX: usize = 50;
/// Smallest accepted age.
pub const AGE_MIN: i64 = 1;
/// Largest accepted age.
pub const AGE_MAX: i64 = 149;
/// Maximum allowed length for a grade label.
pub const GRADE_MAX: usize = 10;
/// Length of a student identifier in hexadecimal characters.
pub const STUDENT_ID_LEN: usize = 24;

/// Validation errors raised while building student values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentValidationError {
    /// A field required on creation was absent.
    #[error("{field} is required")]
    MissingField { field: &'static str },
    /// Identifier is not 24 hexadecimal characters.
    #[error("student id must be a 24 character hexadecimal string")]
    InvalidId,
    /// Name is empty once trimmed.
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("age must be between {min} and {max}")]
    AgeOutOfRange { min: i64, max: i64 },
    #[error("grade must not be empty")]
    EmptyGrade,
    #[error("grade must be at most {max} characters")]
    GradeTooLong { max: usize },
    #[error("email must be a valid address")]
    InvalidEmail,
    /// An update carried no fields at all.
    #[error("no fields provided for update")]
    NoChanges,
}

impl StudentValidationError {
    /// Name of the offending field, when the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field } => Some(field),
            Self::InvalidId => Some("id"),
            Self::EmptyName | Self::NameTooShort { .. } | Self::NameTooLong { .. } => Some("name"),
            Self::AgeOutOfRange { .. } => Some("age"),
            Self::EmptyGrade | Self::GradeTooLong { .. } => Some("grade"),
            Self::InvalidEmail => Some("email"),
            Self::NoChanges => None,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::InvalidId => "invalid_id",
            Self::EmptyName | Self::EmptyGrade => "empty",
            Self::NameTooShort { .. } => "too_short",
            Self::NameTooLong { .. } | Self::GradeTooLong { .. } => "too_long",
            Self::AgeOutOfRange { .. } => "out_of_range",
            Self::InvalidEmail => "invalid_email",
            Self::NoChanges => "no_changes",
        }
    }
}

/// All violations found while validating one payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentValidationErrors(Vec<StudentValidationError>);

impl StudentValidationErrors {
    fn push(&mut self, error: StudentValidationError) {
        self.0.push(error);
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the collected violations in field order.
    pub fn iter(&self) -> impl Iterator<Item = &StudentValidationError> {
        self.0.iter()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<StudentValidationError> for StudentValidationErrors {
    fn from(value: StudentValidationError) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for StudentValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for StudentValidationErrors {}

/// Stable student identifier: a document store object id rendered as 24
/// lowercase hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    /// Validate and construct a [`StudentId`].
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::StudentId;
    ///
    /// let id = StudentId::new("682D9A1B7943CD79B2FAE99D").expect("valid id");
    /// assert_eq!(id.as_ref(), "682d9a1b7943cd79b2fae99d");
    /// assert!(StudentId::new("42").is_err());
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, StudentValidationError> {
        let raw = id.as_ref();
        if raw.len() != STUDENT_ID_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StudentValidationError::InvalidId);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<StudentId> for String {
    fn from(value: StudentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for StudentId {
    type Error = StudentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Student display name, trimmed, between [`NAME_MIN`] and [`NAME_MAX`]
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentName(String);

impl StudentName {
    /// Validate and construct a [`StudentName`].
    pub fn new(name: impl AsRef<str>) -> Result<Self, StudentValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StudentValidationError::EmptyName);
        }
        let length = trimmed.chars().count();
        if length < NAME_MIN {
            return Err(StudentValidationError::NameTooShort { min: NAME_MIN });
        }
        if length > NAME_MAX {
            return Err(StudentValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for StudentName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<StudentName> for String {
    fn from(value: StudentName) -> Self {
        value.0
    }
}

impl TryFrom<String> for StudentName {
    type Error = StudentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Student age in whole years, between [`AGE_MIN`] and [`AGE_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Age(u8);

impl Age {
    /// Validate and construct an [`Age`].
    pub fn new(years: i64) -> Result<Self, StudentValidationError> {
        if !(AGE_MIN..=AGE_MAX).contains(&years) {
            return Err(StudentValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            });
        }
        u8::try_from(years)
            .map(Self)
            .map_err(|_| StudentValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            })
    }

    /// Age in years.
    pub fn years(self) -> u8 {
        self.0
    }
}

impl From<Age> for i64 {
    fn from(value: Age) -> Self {
        i64::from(value.0)
    }
}

impl TryFrom<i64> for Age {
    type Error = StudentValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Academic grade label such as `"6th"` or `"A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Grade(String);

impl Grade {
    /// Validate and construct a [`Grade`].
    pub fn new(grade: impl AsRef<str>) -> Result<Self, StudentValidationError> {
        let trimmed = grade.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StudentValidationError::EmptyGrade);
        }
        if trimmed.chars().count() > GRADE_MAX {
            return Err(StudentValidationError::GradeTooLong { max: GRADE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Grade {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Grade> for String {
    fn from(value: Grade) -> Self {
        value.0
    }
}

impl TryFrom<String> for Grade {
    type Error = StudentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Contact email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl AsRef<str>) -> Result<Self, StudentValidationError> {
        let trimmed = email.as_ref().trim();
        if !email_regex().is_match(trimmed) {
            return Err(StudentValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = StudentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Record a validation failure and return the parsed value on success.
fn collect<T>(
    result: Result<T, StudentValidationError>,
    errors: &mut StudentValidationErrors,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}

fn required<T>(
    value: Option<T>,
    field: &'static str,
    errors: &mut StudentValidationErrors,
) -> Option<T> {
    if value.is_none() {
        errors.push(StudentValidationError::MissingField { field });
    }
    value
}

/// Validated input for creating a student. Carries no identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: StudentName,
    pub age: Age,
    pub grade: Grade,
    pub email: Option<Email>,
}

impl NewStudent {
    /// Validate raw request parts, collecting every violation.
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::NewStudent;
    ///
    /// let student = NewStudent::try_from_parts(
    ///     Some("Alice".into()),
    ///     Some(12),
    ///     Some("6th".into()),
    ///     None,
    /// )
    /// .expect("valid student");
    /// assert_eq!(student.name.as_ref(), "Alice");
    ///
    /// let errors = NewStudent::try_from_parts(None, Some(0), None, None).unwrap_err();
    /// assert_eq!(errors.len(), 3);
    /// ```
    pub fn try_from_parts(
        name: Option<String>,
        age: Option<i64>,
        grade: Option<String>,
        email: Option<String>,
    ) -> Result<Self, StudentValidationErrors> {
        let mut errors = StudentValidationErrors::default();

        let name = required(name, "name", &mut errors)
            .and_then(|raw| collect(StudentName::new(raw), &mut errors));
        let age = required(age, "age", &mut errors)
            .and_then(|raw| collect(Age::new(raw), &mut errors));
        let grade = required(grade, "grade", &mut errors)
            .and_then(|raw| collect(Grade::new(raw), &mut errors));
        let email = match email {
            Some(raw) => collect(Email::new(raw), &mut errors).map(Some),
            None => Some(None),
        };

        match (name, age, grade, email) {
            (Some(name), Some(age), Some(grade), Some(email)) if errors.is_empty() => Ok(Self {
                name,
                age,
                grade,
                email,
            }),
            _ => Err(errors),
        }
    }
}

/// Validated partial update. At least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentChanges {
    pub name: Option<StudentName>,
    pub age: Option<Age>,
    pub grade: Option<Grade>,
    pub email: Option<Email>,
}

impl StudentChanges {
    /// Validate the provided fields of an update, collecting every violation.
    ///
    /// Absent fields are left unchanged. An update with no fields at all is
    /// rejected with [`StudentValidationError::NoChanges`].
    pub fn try_from_parts(
        name: Option<String>,
        age: Option<i64>,
        grade: Option<String>,
        email: Option<String>,
    ) -> Result<Self, StudentValidationErrors> {
        if name.is_none() && age.is_none() && grade.is_none() && email.is_none() {
            return Err(StudentValidationError::NoChanges.into());
        }

        let mut errors = StudentValidationErrors::default();
        let changes = Self {
            name: name.and_then(|raw| collect(StudentName::new(raw), &mut errors)),
            age: age.and_then(|raw| collect(Age::new(raw), &mut errors)),
            grade: grade.and_then(|raw| collect(Grade::new(raw), &mut errors)),
            email: email.and_then(|raw| collect(Email::new(raw), &mut errors)),
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }

    /// Apply the changes to an existing record, leaving the id untouched.
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(grade) = &self.grade {
            student.grade = grade.clone();
        }
        if let Some(email) = &self.email {
            student.email = Some(email.clone());
        }
    }
}

/// Persisted student record.
///
/// ## Invariants
/// - `id` is assigned by the persistence adapter and never changes.
/// - `created_at` is assigned on insertion and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Student {
    id: StudentId,
    name: StudentName,
    age: Age,
    grade: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    created_at: DateTime<Utc>,
}

impl Student {
    /// Assemble a stored record from its identifier, creation time and fields.
    pub fn from_new(id: StudentId, created_at: DateTime<Utc>, student: NewStudent) -> Self {
        let NewStudent {
            name,
            age,
            grade,
            email,
        } = student;
        Self {
            id,
            name,
            age,
            grade,
            email,
            created_at,
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> &StudentId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &StudentName {
        &self.name
    }

    /// Age in whole years.
    pub fn age(&self) -> Age {
        self.age
    }

    /// School grade label.
    pub fn grade(&self) -> &Grade {
        &self.grade
    }

    /// Contact email, if one was given.
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Moment the record was first stored.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
