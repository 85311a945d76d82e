//! Saker of a søknad with their vedtak.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::model::{DEFAULT_SAK_TITTEL, Sak, SaksStatus, UtfallVedtak};
use super::ports::CachePolicy;
use super::{AuthenticatedUser, Error, EventService, FiksService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaksStatusResponse {
    pub tittel: String,
    pub status: SaksStatus,
    pub skal_vise_vedtak_info_panel: bool,
    pub vedtaksfil_url_list: Option<Vec<FilUrl>>,
    pub utfall_vedtak: Option<UtfallVedtak>,
    pub referanse: String,
    pub vedtak_id_list: Vec<String>,
}

/// Link to one vedtak letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilUrl {
    pub dato: Option<NaiveDate>,
    pub url: String,
    pub id: String,
}

#[derive(Clone)]
pub struct SaksStatusService {
    fiks: FiksService,
    event: EventService,
}

impl SaksStatusService {
    pub fn new(fiks: FiksService, event: EventService) -> Self {
        Self { fiks, event }
    }

    /// Saker not registered in error; empty when the søknad has none.
    pub async fn hent_saks_statuser(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<SaksStatusResponse>, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_model(&sak, user).await?;
        if model.saker.is_empty() {
            info!("fant ingen saker");
            return Ok(Vec::new());
        }

        let responses: Vec<SaksStatusResponse> = model.aktive_saker().map(saks_status).collect();
        info!(
            antall = responses.len(),
            statuser = ?responses.iter().map(|r| r.status).collect::<Vec<_>>(),
            "hentet saker"
        );
        Ok(responses)
    }
}

fn saks_status(sak: &Sak) -> SaksStatusResponse {
    let status = if sak.vedtak.is_empty() {
        sak.saks_status.unwrap_or(SaksStatus::UnderBehandling)
    } else {
        SaksStatus::Ferdigbehandlet
    };
    let filer: Vec<FilUrl> = sak
        .vedtak
        .iter()
        .map(|vedtak| FilUrl {
            dato: vedtak.dato,
            url: vedtak.vedtaks_fil_url.clone(),
            id: vedtak.id.clone(),
        })
        .collect();
    let utfall_vedtak = sak.vedtak.last().and_then(|vedtak| vedtak.utfall);

    SaksStatusResponse {
        tittel: sak
            .tittel
            .clone()
            .unwrap_or_else(|| DEFAULT_SAK_TITTEL.to_owned()),
        status,
        skal_vise_vedtak_info_panel: matches!(
            utfall_vedtak,
            Some(UtfallVedtak::Innvilget | UtfallVedtak::DelvisInnvilget)
        ),
        vedtaksfil_url_list: (!filer.is_empty()).then_some(filer),
        utfall_vedtak,
        referanse: sak.referanse.clone(),
        vedtak_id_list: sak.vedtak.iter().map(|vedtak| vedtak.id.clone()).collect(),
    }
}
