//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the application wiring they exercise lives here rather than being copied
//! into each test file.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::Value;
use student_records::inbound::http::health::{HealthState, live, ready};
use student_records::inbound::http::state::HttpState;
use student_records::inbound::http::students;
use student_records::inbound::http::validation::json_config;
use student_records::middleware::{RateLimit, SecurityHeaders, Trace};

/// Quota value that disables rate limiting.
pub const UNLIMITED: u32 = 0;

/// Build the API application over `state`.
///
/// The middleware stack mirrors the production server: tracing outermost,
/// security headers on every response and rate limiting on `/api/v1` only.
pub fn build_app(
    state: HttpState,
    requests_per_minute: u32,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    App::new()
        .app_data(web::Data::new(state))
        .app_data(health)
        .app_data(json_config())
        .wrap(SecurityHeaders::new())
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(RateLimit::per_minute(requests_per_minute))
                .configure(students::configure),
        )
        .service(ready)
        .service(live)
}

/// Read a JSON body from a test response.
pub async fn read_json<B: MessageBody>(response: ServiceResponse<B>) -> Value {
    let bytes = actix_test::read_body(response).await;
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// Extract the `id` of a created student.
pub fn student_id(body: &Value) -> String {
    body.get("id")
        .and_then(Value::as_str)
        .expect("student has an id")
        .to_owned()
}
