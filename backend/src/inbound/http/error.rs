//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while turning domain
//! failures into the `{ type, message }` envelope the frontend expects.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::error::NOE_UVENTET_FEILET;
use crate::domain::{CALL_ID_HEADER, Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

pub const UNEXPECTED_ERROR: &str = "unexpected_error";
pub const FIKS_ERROR: &str = "fiks_error";
pub const NORG_ERROR: &str = "norg_error";
pub const PDL_ERROR: &str = "pdl_error";
pub const FILOPPLASTING_ERROR: &str = "FILOPPLASTING_ERROR";
pub const TILGANG_ERROR: &str = "tilgang_error";
const TOKEN_UTLOPT: &str = "Token utløpt";
const AUTHENTICATION_ERROR: &str = "authentication_error";

/// Error body returned for every failure except missing authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FrontendErrorMessage {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

/// Body of a `401` telling the frontend where to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrontendUnauthorizedMessage {
    pub id: String,
    pub error: String,
    pub message: String,
    pub login_url: Option<String>,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::UnexpectedError
        | ErrorCode::FiksError
        | ErrorCode::NorgError
        | ErrorCode::PdlError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::FiksNotFound => StatusCode::NOT_FOUND,
        ErrorCode::TokenExpired | ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::FilopplastingError | ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::VirusFound => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::TilgangError => StatusCode::FORBIDDEN,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn type_for(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::FiksError | ErrorCode::FiksNotFound => FIKS_ERROR,
        ErrorCode::NorgError => NORG_ERROR,
        ErrorCode::PdlError => PDL_ERROR,
        ErrorCode::FilopplastingError | ErrorCode::VirusFound => FILOPPLASTING_ERROR,
        ErrorCode::TilgangError => TILGANG_ERROR,
        ErrorCode::TokenExpired => TOKEN_UTLOPT,
        ErrorCode::UnexpectedError
        | ErrorCode::Unauthorized
        | ErrorCode::ServiceUnavailable
        | ErrorCode::InvalidRequest => UNEXPECTED_ERROR,
    }
}

/// Frontend body for a domain error; unexpected failures are redacted.
pub fn frontend_message(error: &Error) -> FrontendErrorMessage {
    let message = match error.code() {
        ErrorCode::UnexpectedError => NOE_UVENTET_FEILET.to_owned(),
        ErrorCode::TilgangError => "Ingen tilgang".to_owned(),
        _ => error.message().to_owned(),
    };
    FrontendErrorMessage {
        type_: type_for(error.code()).to_owned(),
        message,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.call_id() {
            builder.insert_header((CALL_ID_HEADER, id.to_owned()));
        }
        if self.code() == ErrorCode::Unauthorized {
            return builder.json(FrontendUnauthorizedMessage {
                id: AUTHENTICATION_ERROR.to_owned(),
                error: AUTHENTICATION_ERROR.to_owned(),
                message: "Autentiseringsfeil".to_owned(),
                login_url: self.login_url().map(str::to_owned),
            });
        }
        builder.json(frontend_message(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::unexpected(NOE_UVENTET_FEILET)
    }
}
