//! Domain types, the event fold and the services behind every endpoint.
//!
//! Purpose: rebuild the innsyn read model from Fiks documents and project it
//! into frontend responses. Domain code reaches upstream systems only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure.
//! - ErrorCode (alias to `error::ErrorCode`): stable error category.
//! - AuthenticatedUser / Token: the logged-in citizen.
//! - CallId: request correlation identifier.
//! - One service per feature slice, each cheap to clone.

pub mod auth;
pub mod call_id;
pub mod digisos;
pub mod error;
pub mod event;
pub mod fiks;
pub mod forelopig_svar;
pub mod hendelse;
pub mod kommune;
pub mod model;
pub mod oppgave;
pub mod pdf;
pub mod ports;
pub mod saks_status;
pub mod saksoversikt;
pub mod soknads_status;
pub mod support;
pub mod tilgang;
pub mod utbetalinger;
pub mod vedlegg;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::auth::{AuthenticatedUser, Token};
pub use self::call_id::{CALL_ID_HEADER, CallId};
pub use self::error::{Error, ErrorCode};
pub use self::event::EventService;
pub use self::fiks::FiksService;
pub use self::forelopig_svar::{ForelopigSvarResponse, ForelopigSvarService};
pub use self::hendelse::HendelseService;
pub use self::kommune::{KommuneResponse, KommuneService};
pub use self::oppgave::OppgaveService;
pub use self::pdf::EttersendelsePdfGenerator;
pub use self::saks_status::SaksStatusService;
pub use self::saksoversikt::SaksoversiktService;
pub use self::soknads_status::SoknadsStatusService;
pub use self::tilgang::{Tilgang, TilgangService};
pub use self::utbetalinger::UtbetalingerService;
pub use self::vedlegg::{VedleggOpplastingService, VedleggService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use innsyn_api::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::tilgang("Ingen tilgang"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
