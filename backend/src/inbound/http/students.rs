//! Student records HTTP handlers.
//!
//! ```text
//! POST   /api/v1/students       {"name":"Alice","age":12,"grade":"6th"}
//! GET    /api/v1/students
//! GET    /api/v1/students/{id}
//! PUT    /api/v1/students/{id}  {"age":13}
//! DELETE /api/v1/students/{id}
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{NewStudent, Student, StudentChanges};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, StudentSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_student_id, student_validation_error};

const ID_FIELD: FieldName = FieldName::new("id");

/// Request body for `POST /api/v1/students`.
///
/// `name`, `age` and `grade` are required; `email` is optional. Fields are
/// optional at the wire level so that every violation can be reported at once.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateStudentRequest {
    /// Full name, 2 to 50 characters after trimming.
    #[schema(example = "Alice")]
    pub name: Option<String>,
    /// Age in years, 1 to 149.
    #[schema(example = 12)]
    pub age: Option<i64>,
    /// Grade label, 1 to 10 characters.
    #[schema(example = "6th")]
    pub grade: Option<String>,
    /// Unique contact address.
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
}

/// Request body for `PUT /api/v1/students/{id}`.
///
/// Absent fields are left unchanged; at least one field must be present.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateStudentRequest {
    #[schema(example = "Alice Smith")]
    pub name: Option<String>,
    #[schema(example = 13)]
    pub age: Option<i64>,
    #[schema(example = "7th")]
    pub grade: Option<String>,
    #[schema(example = "alice.smith@example.com")]
    pub email: Option<String>,
}

fn parse_new_student(payload: CreateStudentRequest) -> ApiResult<NewStudent> {
    let CreateStudentRequest {
        name,
        age,
        grade,
        email,
    } = payload;
    NewStudent::try_from_parts(name, age, grade, email)
        .map_err(|errors| student_validation_error(&errors))
}

fn parse_changes(payload: UpdateStudentRequest) -> ApiResult<StudentChanges> {
    let UpdateStudentRequest {
        name,
        age,
        grade,
        email,
    } = payload;
    StudentChanges::try_from_parts(name, age, grade, email)
        .map_err(|errors| student_validation_error(&errors))
}

/// Create a student record.
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudentRequest,
    responses(
        (
            status = 201,
            description = "Student created",
            headers(("Location" = String, description = "URL of the new record")),
            body = StudentSchema
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema),
        (status = 429, description = "Rate limit exceeded", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "createStudent"
)]
#[post("/students")]
pub async fn create_student(
    state: web::Data<HttpState>,
    payload: web::Json<CreateStudentRequest>,
) -> ApiResult<HttpResponse> {
    let student = parse_new_student(payload.into_inner())?;
    let created = state.students.create(student).await?;
    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("/api/v1/students/{}", created.id()),
        ))
        .json(created))
}

/// List every student record.
///
/// Returns an empty array when no records exist.
#[utoipa::path(
    get,
    path = "/api/v1/students",
    responses(
        (status = 200, description = "Student records", body = [StudentSchema]),
        (status = 429, description = "Rate limit exceeded", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "listStudents"
)]
#[get("/students")]
pub async fn list_students(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Student>>> {
    let students = state.students_query.list().await?;
    Ok(web::Json(students))
}

/// Fetch one student record.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "24 character hexadecimal identifier")),
    responses(
        (status = 200, description = "Student record", body = StudentSchema),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Student not found", body = ErrorSchema),
        (status = 429, description = "Rate limit exceeded", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "getStudent"
)]
#[get("/students/{id}")]
pub async fn get_student(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Student>> {
    let id = parse_student_id(&path, ID_FIELD)?;
    let student = state.students_query.get(&id).await?;
    Ok(web::Json(student))
}

/// Apply a partial update to a student record.
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "24 character hexadecimal identifier")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated student record", body = StudentSchema),
        (status = 400, description = "Invalid request or empty update", body = ErrorSchema),
        (status = 404, description = "Student not found", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema),
        (status = 429, description = "Rate limit exceeded", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "updateStudent"
)]
#[put("/students/{id}")]
pub async fn update_student(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateStudentRequest>,
) -> ApiResult<web::Json<Student>> {
    let id = parse_student_id(&path, ID_FIELD)?;
    let changes = parse_changes(payload.into_inner())?;
    let student = state.students.update(&id, changes).await?;
    Ok(web::Json(student))
}

/// Delete a student record.
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(("id" = String, Path, description = "24 character hexadecimal identifier")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Student not found", body = ErrorSchema),
        (status = 429, description = "Rate limit exceeded", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["students"],
    operation_id = "deleteStudent"
)]
#[delete("/students/{id}")]
pub async fn delete_student(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_student_id(&path, ID_FIELD)?;
    state.students.delete(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every student handler on a service config.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use student_records::inbound::http::students;
///
/// let app = App::new().service(web::scope("/api/v1").configure(students::configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_student)
        .service(list_students)
        .service(get_student)
        .service(update_student)
        .service(delete_student);
}

#[cfg(test)]
#[path = "students_tests.rs"]
mod tests;
