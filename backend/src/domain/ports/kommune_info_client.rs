//! Driven port for kommune capabilities registered in Fiks.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::digisos::KommuneInfo;

define_port_error! {
    /// Errors surfaced while fetching kommune info.
    pub enum KommuneInfoClientError {
        /// Fiks has no entry for the kommune.
        NotFound { kommunenummer: String } => "fant ikke kommuneinfo for {kommunenummer}",
        /// Fiks or the token service failed.
        Upstream { message: String } => "kommuneinfo feilet: {message}",
    }
}

/// Port for looking up one kommune.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KommuneInfoClient: Send + Sync {
    async fn hent_kommune_info(
        &self,
        kommunenummer: &str,
    ) -> Result<KommuneInfo, KommuneInfoClientError>;
}
