//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses carrying the frontend error envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CallId;

/// Generic message shown to users when the cause must not leak.
pub const NOE_UVENTET_FEILET: &str = "Noe uventet feilet";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// An unexpected error occurred inside the service.
    UnexpectedError,
    /// A call to Fiks failed.
    FiksError,
    /// The requested digisos sak does not exist in Fiks.
    FiksNotFound,
    /// Fiks rejected the exchanged token.
    TokenExpired,
    /// A call to NORG failed.
    NorgError,
    /// A call to PDL failed.
    PdlError,
    /// An attachment upload was rejected.
    FilopplastingError,
    /// The virus scanner flagged an attachment.
    VirusFound,
    /// The user is not permitted to see the resource.
    TilgangError,
    /// Authentication failed or is missing.
    Unauthorized,
    /// An upstream dependency is unavailable.
    ServiceUnavailable,
    /// The request is malformed or fails validation.
    InvalidRequest,
}

/// Domain error payload.
///
/// `message` is safe to show to the frontend; callers log upstream detail
/// before constructing the error.
///
/// # Examples
/// ```
/// use innsyn_api::domain::{Error, ErrorCode};
///
/// let err = Error::tilgang("Ingen tilgang");
/// assert_eq!(err.code(), ErrorCode::TilgangError);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: String,
    call_id: Option<String>,
    login_url: Option<String>,
}

impl Error {
    /// Create a new error, capturing the call identifier in scope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            call_id: CallId::current().map(|id| id.to_string()),
            login_url: None,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Call identifier captured when the error was created.
    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    /// Login URL the frontend should redirect to on `401`.
    pub fn login_url(&self) -> Option<&str> {
        self.login_url.as_deref()
    }

    /// Attach a call identifier to the error.
    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.call_id = Some(id.into());
        self
    }

    /// Attach the login URL returned with authentication failures.
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::UnexpectedError`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedError, message)
    }

    /// Convenience constructor for [`ErrorCode::FiksError`].
    pub fn fiks(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FiksError, message)
    }

    /// Convenience constructor for [`ErrorCode::FiksNotFound`].
    pub fn fiks_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FiksNotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::TokenExpired`].
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired, "Token utløpt")
    }

    /// Convenience constructor for [`ErrorCode::NorgError`].
    pub fn norg(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NorgError, message)
    }

    /// Convenience constructor for [`ErrorCode::PdlError`].
    pub fn pdl(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PdlError, message)
    }

    /// Convenience constructor for [`ErrorCode::FilopplastingError`].
    pub fn filopplasting(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FilopplastingError, message)
    }

    /// Convenience constructor for [`ErrorCode::VirusFound`].
    pub fn virus_found() -> Self {
        Self::new(ErrorCode::VirusFound, "Mulig virus funnet")
    }

    /// Convenience constructor for [`ErrorCode::TilgangError`].
    pub fn tilgang(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TilgangError, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}
