//! Driven port for NAV office lookups in NORG.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;

/// NAV office as returned by NORG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavEnhet {
    pub enhet_nr: String,
    pub navn: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sosiale_tjenester: Option<String>,
}

define_port_error! {
    /// Errors surfaced while calling NORG.
    pub enum NorgClientError {
        /// NORG answered with an error status.
        Status { status: u16, message: String } => "norg svarte {status}: {message}",
        /// The request never produced a response.
        Transport { message: String } => "norg transportfeil: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "norg svar kunne ikke leses: {message}",
    }
}

/// Port for resolving enhetsnummer to office details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NorgClient: Send + Sync {
    async fn hent_nav_enhet(&self, enhetsnr: &str) -> Result<NavEnhet, NorgClientError>;
}
