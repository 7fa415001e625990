//! Per-client request rate limiting.
//!
//! Clients are keyed by the first `X-Forwarded-For` entry, falling back to
//! the peer IP. Each key gets a GCRA quota of `requests_per_minute`; excess
//! requests are answered with `429 Too Many Requests` and `Retry-After: 60`
//! without reaching the wrapped service.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{Error, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::Error as DomainError;

/// Seconds clients are told to wait once limited.
pub const RETRY_AFTER_SECS: u64 = 60;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";
const MAX_TRACKED_CLIENTS: usize = 10_000;

type ClientRateLimiter = DefaultKeyedRateLimiter<String>;

/// Rate limiting middleware shared by every worker.
///
/// Build it once and clone it into the `HttpServer` factory so all workers
/// consult the same limiter state.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use student_records::middleware::RateLimit;
///
/// let limit = RateLimit::per_minute(60);
/// let _app = App::new().wrap(limit.clone());
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: Option<Arc<ClientRateLimiter>>,
    requests_per_minute: u32,
}

impl RateLimit {
    /// Allow `requests` per minute per client; `0` disables limiting.
    pub fn per_minute(requests: u32) -> Self {
        let limiter = NonZeroU32::new(requests)
            .map(|quota| Arc::new(RateLimiter::keyed(Quota::per_minute(quota))));
        Self {
            limiter,
            requests_per_minute: requests,
        }
    }

    /// Whether requests are being limited at all.
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    fn allows(&self, client: &str) -> bool {
        let Some(limiter) = &self.limiter else {
            return true;
        };
        let allowed = limiter.check_key(&client.to_owned()).is_ok();
        if limiter.len() > MAX_TRACKED_CLIENTS {
            limiter.retain_recent();
        }
        allowed
    }
}

/// Identify the client for quota accounting.
fn client_key(req: &ServiceRequest) -> String {
    req.headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limit: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: S,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = client_key(&req);
        if self.limit.allows(&client) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let per_minute = self.limit.requests_per_minute;
        Box::pin(async move {
            warn!(%client, per_minute, "rate limit exceeded");
            let error = DomainError::too_many_requests("too many requests, try again later")
                .with_details(json!({ "retryAfter": RETRY_AFTER_SECS }));
            let mut response = error.error_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
            debug!(status = response.status().as_u16(), "request rejected");
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}
