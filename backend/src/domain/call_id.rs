//! Request-scoped call identifier for correlation across NAV services.
//!
//! `CallId` follows a request through logs, error payloads and outbound
//! calls. The frontend supplies it through the `Nav-Call-Id` header; when the
//! header is missing a UUID is generated.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`CallId::scope`] when spawning new tasks so the active identifier
//! propagates.

use std::fmt;
use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Header carrying the call identifier on inbound and outbound requests.
pub const CALL_ID_HEADER: &str = "Nav-Call-Id";

task_local! {
    /// Task-local storage for the current call identifier.
    pub(crate) static CALL_ID: CallId;
}

/// Per-request call identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use innsyn_api::domain::CallId;
///
/// async fn handler() {
///     if let Some(id) = CallId::current() {
///         tracing::info!(call_id = %id, "handling request");
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallId(String);

impl CallId {
    /// Generate a new random call identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied identifier, falling back to a generated one
    /// when the value is blank.
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::generate()
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Returns the current call identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        CALL_ID.try_with(Clone::clone).ok()
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Execute the provided future with the supplied call identifier in scope.
    ///
    /// # Examples
    /// ```
    /// use innsyn_api::domain::CallId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let call_id = CallId::from_header("abc-123");
    /// let observed = CallId::scope(call_id.clone(), async move { CallId::current() }).await;
    /// assert_eq!(observed, Some(call_id));
    /// # });
    /// ```
    pub async fn scope<Fut>(call_id: CallId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CALL_ID.scope(call_id, fut).await
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
