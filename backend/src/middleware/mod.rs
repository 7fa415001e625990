//! Request middleware.
//!
//! Purpose: define middleware components for request lifecycle concerns such
//! as tracing, rate limiting and browser hardening headers.

pub mod rate_limit;
pub mod security_headers;
pub mod trace;

pub use rate_limit::RateLimit;
pub use security_headers::SecurityHeaders;
pub use trace::Trace;
