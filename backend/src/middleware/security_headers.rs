//! Browser hardening headers added to every response.
//!
//! Headers already set by a handler are left untouched. The
//! `Content-Security-Policy` header is skipped under the documentation
//! prefixes so the Swagger UI and ReDoc pages can load their inline assets.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};

const HARDENING_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "geolocation=(), microphone=(), camera=()",
    ),
];

/// Default content security policy.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'";

/// Security headers middleware.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use student_records::middleware::SecurityHeaders;
///
/// let _app = App::new().wrap(
///     SecurityHeaders::new()
///         .exempt_csp("/api/v1/docs")
///         .exempt_csp("/api/v1/redoc"),
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct SecurityHeaders {
    csp_exempt_prefixes: Vec<String>,
}

impl SecurityHeaders {
    /// Middleware applying every header, CSP included, on all paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the content security policy for paths under `prefix`.
    ///
    /// May be called repeatedly; each prefix is exempted.
    #[must_use]
    pub fn exempt_csp(mut self, prefix: &str) -> Self {
        self.csp_exempt_prefixes.push(prefix.to_owned());
        self
    }

    fn applies_csp(&self, path: &str) -> bool {
        !self
            .csp_exempt_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service,
            config: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`SecurityHeaders`].
pub struct SecurityHeadersMiddleware<S> {
    service: S,
    config: SecurityHeaders,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let with_csp = self.config.applies_csp(req.path());
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();
            for (name, value) in HARDENING_HEADERS {
                if !headers.contains_key(name) {
                    headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
                }
            }
            if with_csp && !headers.contains_key(header::CONTENT_SECURITY_POLICY) {
                headers.insert(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                );
            }
            Ok(res)
        })
    }
}
