//! Overall status of one søknad.

use std::sync::Arc;

use chrono::NaiveDateTime;
use mockable::Clock;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::model::{SoknadsStatus, UrlResponse};
use super::ports::CachePolicy;
use super::support::{DokumentUrls, now_local};
use super::{AuthenticatedUser, Error, EventService, FiksService, KommuneService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoknadsStatusResponse {
    pub status: SoknadsStatus,
    pub tidspunkt_sendt: Option<NaiveDateTime>,
    /// Minutes since the søknad was sent, `-1` when unknown.
    pub soknadsalder_i_minutter: i64,
    /// Only set when the kommune has innsyn deactivated.
    pub nav_kontor: Option<String>,
    /// Only set when the kommune has innsyn deactivated.
    pub fil_url: Option<UrlResponse>,
    pub kommunenummer: String,
    pub nav_ekstern_ref_id: Option<String>,
    pub tittel: String,
}

#[derive(Clone)]
pub struct SoknadsStatusService {
    fiks: FiksService,
    event: EventService,
    kommune: KommuneService,
    urls: DokumentUrls,
    clock: Arc<dyn Clock>,
}

impl SoknadsStatusService {
    pub fn new(
        fiks: FiksService,
        event: EventService,
        kommune: KommuneService,
        urls: DokumentUrls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fiks,
            event,
            kommune,
            urls,
            clock,
        }
    }

    pub async fn hent_soknads_status(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<SoknadsStatusResponse, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_model(&sak, user).await?;
        info!(status = ?model.status, "hentet nåværende søknadsstatus");

        let innsyn_deaktivert = self.kommune.er_innsyn_deaktivert_for_kommune(&sak).await?;
        let original = sak.original_soknad_nav.as_ref();
        let (nav_kontor, fil_url) = if innsyn_deaktivert {
            (
                model
                    .soknadsmottaker
                    .as_ref()
                    .and_then(|mottaker| mottaker.nav_enhetsnavn.clone()),
                original.map(|original| {
                    UrlResponse::vis_brevet(
                        self.urls
                            .dokumentlager_url(&original.soknad_dokument.dokumentlager_dokument_id),
                    )
                }),
            )
        } else {
            (None, None)
        };

        Ok(SoknadsStatusResponse {
            status: model.status,
            tidspunkt_sendt: model.tidspunkt_sendt,
            soknadsalder_i_minutter: model.tidspunkt_sendt.map_or(-1, |sendt| {
                (now_local(self.clock.as_ref()) - sendt).num_minutes()
            }),
            nav_kontor,
            fil_url,
            kommunenummer: sak.kommunenummer.clone(),
            nav_ekstern_ref_id: original.map(|original| original.nav_ekstern_ref_id.clone()),
            tittel: model.saks_titler(),
        })
    }
}
