//! Server construction and middleware wiring.

mod config;

pub use config::{AppSettings, ServerConfig};

use actix_cors::Cors;
use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

use student_records::doc::ApiDoc;
use student_records::inbound::http::health::{HealthState, live, ready};
use student_records::inbound::http::state::HttpState;
use student_records::inbound::http::students;
use student_records::inbound::http::validation::json_config;
use student_records::middleware::{RateLimit, SecurityHeaders, Trace};

/// Prefix under which the Swagger UI is served.
const DOCS_PREFIX: &str = "/api/v1/docs";
const REDOC_PATH: &str = "/api/v1/redoc";
const OPENAPI_PATH: &str = "/api/v1/openapi.json";
const CORS_MAX_AGE_SECS: usize = 3600;

fn build_cors(origins: &[String]) -> Cors {
    let cors = origins.iter().fold(Cors::default(), |cors, origin| {
        if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        }
    });
    cors.allowed_methods(["GET", "POST", "PUT", "DELETE"])
        .allow_any_header()
        .supports_credentials()
        .max_age(CORS_MAX_AGE_SECS)
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    allowed_origins: Vec<String>,
    rate_limit: RateLimit,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        allowed_origins,
        rate_limit,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(rate_limit)
        .configure(students::configure);

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .wrap(
            SecurityHeaders::new()
                .exempt_csp(DOCS_PREFIX)
                .exempt_csp(REDOC_PATH),
        )
        .wrap(build_cors(&allowed_origins))
        .wrap(Trace)
        // Registered ahead of the API scope, which would otherwise claim
        // every `/api/v1` path.
        .service(
            SwaggerUi::new(format!("{DOCS_PREFIX}/{{_:.*}}")).url(OPENAPI_PATH, ApiDoc::openapi()),
        )
        .service(web::redirect(DOCS_PREFIX, format!("{DOCS_PREFIX}/")))
        .service(Redoc::with_url(REDOC_PATH, ApiDoc::openapi()))
        .service(api)
        .service(ready)
        .service(live)
        .service(web::redirect("/", format!("{DOCS_PREFIX}/")))
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Readiness is flipped once the listener is bound. Actix's own signal
/// handling is disabled; callers stop the server through [`drain`].
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        allowed_origins,
        requests_per_minute,
        http_state,
    } = config;
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state: web::Data::new(http_state),
        allowed_origins,
        rate_limit: RateLimit::per_minute(requests_per_minute),
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .disable_signals()
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}

/// Fail the health probes, then stop the server gracefully, letting
/// in-flight requests finish.
pub async fn drain(health_state: &HealthState, handle: ServerHandle) {
    health_state.mark_unhealthy();
    info!("draining HTTP server");
    handle.stop(true).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;
    use student_records::test_support::in_memory_state;

    fn deps(requests_per_minute: u32) -> AppDependencies {
        let (state, _repository) = in_memory_state();
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(state),
            allowed_origins: vec!["http://localhost:3000".to_owned()],
            rate_limit: RateLimit::per_minute(requests_per_minute),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn root_redirects_to_docs() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request())
                .await;

        assert!(res.status().is_redirection());
        assert_eq!(
            res.headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/api/v1/docs/")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn docs_without_trailing_slash_redirect_to_swagger_ui() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(DOCS_PREFIX).to_request(),
        )
        .await;

        assert!(res.status().is_redirection());
        assert_eq!(
            res.headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/api/v1/docs/")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn redoc_page_is_served_without_csp() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(REDOC_PATH).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(res.headers().contains_key(header::X_FRAME_OPTIONS));
        let body = actix_test::read_body(res).await;
        assert!(String::from_utf8_lossy(&body).contains("redoc"));
    }

    #[rstest]
    #[actix_web::test]
    async fn openapi_document_is_served() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(OPENAPI_PATH).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[rstest]
    #[actix_web::test]
    async fn swagger_ui_is_exempt_from_csp() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/docs/")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(res.headers().contains_key(header::X_CONTENT_TYPE_OPTIONS));
    }

    #[rstest]
    #[actix_web::test]
    async fn preflight_allows_configured_origin() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let req = actix_test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/v1/students")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("http://localhost:3000")
        );
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_MAX_AGE)
                .and_then(|value| value.to_str().ok()),
            Some("3600")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn api_responses_carry_security_headers() {
        let app = actix_test::init_service(build_app(deps(60))).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/students")
            .set_json(json!({ "name": "Alice", "age": 12, "grade": "6th" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert!(res.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(res.headers().contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[rstest]
    #[actix_web::test]
    async fn drain_fails_probes_and_stops_the_server() {
        let (state, _repository) = in_memory_state();
        let bind_addr = "127.0.0.1:0".parse().expect("socket address");
        let health_state = web::Data::new(HealthState::new());
        let server = create_server(health_state.clone(), ServerConfig::new(bind_addr, state))
            .expect("server binds");
        assert!(health_state.is_ready());

        let handle = server.handle();
        let running = actix_web::rt::spawn(server);
        drain(&health_state, handle).await;

        running
            .await
            .expect("server task joins")
            .expect("server exits cleanly");
        assert!(!health_state.is_alive());
        assert!(!health_state.is_ready());
    }

    #[rstest]
    #[actix_web::test]
    async fn health_probes_are_not_rate_limited() {
        let app = actix_test::init_service(build_app(deps(1))).await;
        for _ in 0..3 {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri("/health/ready")
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
        }
    }
}
