//! Correlation identifier for one HTTP request.
//!
//! The `Trace` middleware opens a scope per request; anything running inside
//! it, including [`crate::domain::Error`] constructors, can read the active
//! identifier through [`TraceId::current`]. The value lives in a tokio
//! task-local, so work spawned onto another task must re-enter the scope with
//! [`TraceId::scope`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use uuid::Uuid;

/// Response header echoing the identifier back to clients.
pub const TRACE_ID_HEADER: &str = "trace-id";

tokio::task_local! {
    static ACTIVE: TraceId;
}

/// Random UUID naming a single request.
///
/// # Examples
/// ```
/// use student_records::domain::TraceId;
///
/// let id: TraceId = "6f1e9c1a-3d0e-4c9b-9a57-2b5f0e6d8a41".parse().expect("uuid");
/// assert_eq!(id.to_string(), "6f1e9c1a-3d0e-4c9b-9a57-2b5f0e6d8a41");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of the request being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the active identifier.
    ///
    /// # Examples
    /// ```
    /// use student_records::domain::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
    /// let id: TraceId = "6f1e9c1a-3d0e-4c9b-9a57-2b5f0e6d8a41".parse().expect("uuid");
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # });
    /// ```
    pub async fn scope<F: Future>(trace_id: Self, fut: F) -> F::Output {
        ACTIVE.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}
