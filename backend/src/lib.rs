//! Student records service library.
//!
//! Layout follows a hexagonal split: [`domain`] owns entities, ports and
//! services; [`inbound`] exposes them over HTTP; [`outbound`] persists them
//! in MongoDB.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
