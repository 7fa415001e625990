//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every student CRUD endpoint plus the health probes
//! - **Schemas**: domain type wrappers ([`ErrorSchema`], [`ErrorCodeSchema`],
//!   [`StudentSchema`]) that provide OpenAPI definitions without coupling
//!   domain types to the utoipa framework, and the request bodies
//!
//! The document is served at `/api/v1/openapi.json`, rendered by Swagger UI
//! under `/api/v1/docs/`, and exported via `cargo run --bin openapi-dump`.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema, StudentSchema};
use crate::inbound::http::students::{CreateStudentRequest, UpdateStudentRequest};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Management API",
        description = "Create, list, fetch, update and delete student records stored in MongoDB.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::students::create_student,
        crate::inbound::http::students::list_students,
        crate::inbound::http::students::get_student,
        crate::inbound::http::students::update_student,
        crate::inbound::http::students::delete_student,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        StudentSchema,
        CreateStudentRequest,
        UpdateStudentRequest,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "students", description = "Student record management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure.
    //!
    //! Path coverage is checked by `backend/tests/openapi_document.rs`.

    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn openapi_student_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let student_schema = schemas.get("Student").expect("Student schema");

        for field in ["id", "name", "age", "grade", "email", "createdAt"] {
            assert_object_schema_has_field(student_schema, field);
        }
    }

    #[test]
    fn openapi_title_names_the_service() {
        assert_eq!(ApiDoc::openapi().info.title, "Student Management API");
    }
}
