//! Per-request correlation and access logging.
//!
//! [`Trace`] opens a [`TraceId`] scope around the wrapped service, echoes the
//! identifier in the `trace-id` response header and writes one
//! `request completed` line per response. Errors from inner middleware are
//! rendered into responses here so they are stamped and logged too.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{info, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Outermost middleware of the service.
///
/// Anything below it, handlers included, can read the identifier through
/// [`TraceId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use student_records::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
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
        let trace_id = TraceId::generate();
        let access = AccessLine {
            method: req.method().clone(),
            path: req.path().to_owned(),
            started: Instant::now(),
        };
        let http_req = req.request().clone();
        let fut = self.service.call(req);
        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = match fut.await {
                Ok(res) => res.map_into_left_body(),
                Err(err) => {
                    ServiceResponse::new(http_req, err.error_response()).map_into_right_body()
                }
            };
            stamp_trace_header(&mut res, trace_id);
            access.emit(trace_id, res.status().as_u16());
            Ok(res)
        }))
    }
}

struct AccessLine {
    method: Method,
    path: String,
    started: Instant,
}

impl AccessLine {
    fn emit(&self, trace_id: TraceId, status: u16) {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            trace_id = %trace_id,
            method = %self.method,
            path = %self.path,
            status,
            elapsed_ms,
            "request completed"
        );
    }
}

fn stamp_trace_header<B>(res: &mut ServiceResponse<B>, trace_id: TraceId) {
    match HeaderValue::from_str(&trace_id.to_string()) {
        Ok(value) => {
            res.headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(error) => warn!(%error, %trace_id, "trace identifier is not a valid header value"),
    }
}
