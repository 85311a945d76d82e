//! Kommune capabilities for one søknad.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::digisos::{DigisosSak, KommuneInfo};
use super::ports::{CachePolicy, KommuneInfoClient};
use super::{AuthenticatedUser, Error, FiksService};

/// Answer for `/{fiksDigisosId}/kommune`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KommuneResponse {
    pub er_innsyn_deaktivert: bool,
    pub er_innsyn_midlertidig_deaktivert: bool,
    pub er_innsending_ettersendelse_deaktivert: bool,
    pub er_innsending_ettersendelse_midlertidig_deaktivert: bool,
    pub tidspunkt: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kommunenummer: Option<String>,
}

impl KommuneResponse {
    /// Flags derived from kommune info; a missing kommune disables everything.
    pub fn from_info(info: Option<&KommuneInfo>, tidspunkt: DateTime<Utc>) -> Self {
        Self {
            er_innsyn_deaktivert: info.is_none_or(|info| !info.kan_oppdatere_status),
            er_innsyn_midlertidig_deaktivert: info
                .is_none_or(|info| info.har_midlertidig_deaktivert_oppdateringer),
            er_innsending_ettersendelse_deaktivert: info
                .is_none_or(|info| !info.kan_motta_soknader),
            er_innsending_ettersendelse_midlertidig_deaktivert: info
                .is_none_or(|info| info.har_midlertidig_deaktivert_mottak),
            tidspunkt,
            kommunenummer: info.map(|info| info.kommunenummer.clone()),
        }
    }
}

#[derive(Clone)]
pub struct KommuneService {
    fiks: FiksService,
    kommune_info: Arc<dyn KommuneInfoClient>,
    clock: Arc<dyn Clock>,
}

impl KommuneService {
    pub fn new(
        fiks: FiksService,
        kommune_info: Arc<dyn KommuneInfoClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fiks,
            kommune_info,
            clock,
        }
    }

    /// Kommune info for the sak's kommune, `None` when Fiks cannot answer.
    pub async fn hent_kommune_info(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Option<KommuneInfo>, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        self.hent_kommune_info_for_sak(&sak).await
    }

    pub async fn hent_kommune_info_for_sak(
        &self,
        sak: &DigisosSak,
    ) -> Result<Option<KommuneInfo>, Error> {
        if sak.kommunenummer.trim().is_empty() {
            warn!(
                fiks_digisos_id = %sak.fiks_digisos_id,
                "forsøkte å hente kommuneinfo, men digisosSak mangler kommunenummer"
            );
            return Err(Error::unexpected(
                "KommuneStatus kan ikke hentes fordi DigisosSak mangler kommunenummer",
            ));
        }
        match self.kommune_info.hent_kommune_info(&sak.kommunenummer).await {
            Ok(info) => Ok(Some(info)),
            Err(err) => {
                warn!(kommunenummer = %sak.kommunenummer, error = %err, "Fiks - hentKommuneInfo feilet");
                Ok(None)
            }
        }
    }

    /// True when the kommune is unknown or does not publish status updates.
    pub async fn er_innsyn_deaktivert_for_kommune(&self, sak: &DigisosSak) -> Result<bool, Error> {
        let info = self.hent_kommune_info_for_sak(sak).await?;
        Ok(info.is_none_or(|info| !info.kan_oppdatere_status))
    }

    /// Frontend view of the kommune flags.
    pub async fn hent_kommune_response(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<KommuneResponse, Error> {
        let info = self.hent_kommune_info(fiks_digisos_id, user).await?;
        Ok(KommuneResponse::from_info(info.as_ref(), self.clock.utc()))
    }
}
