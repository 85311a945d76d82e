//! Vedlegg already uploaded to a søknad, and uploads of new ones.
//!
//! Fiks stores files in the dokumentlager without their vedlegg type. The
//! type comes from the `vedlegg.json` specification of each innsending,
//! which lists filenames in the same order as the stored documents.

mod filnavn;
mod opplasting;
mod validering;

pub use filnavn::{
    FileNameSplit, contains_illegal_characters, lag_filnavn, remove_uuid_from_filename,
    sanitize_file_name, split_file_name,
};
pub use opplasting::{
    InnsendtFil, OppgaveOpplastingResponse, OpplastetFilMetadata, OpplastetVedleggMetadata,
    VedleggOpplastingResponse, VedleggOpplastingService, lag_nav_ekstern_ref_id,
};
pub use validering::{FilType, MAKS_FILSTORRELSE, ValidationResult, ValidationValue};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use super::digisos::{
    DigisosSak, DokumentInfo, Ettersendelse, JsonFiler, JsonVedlegg, JsonVedleggSpesifikasjon,
    LASTET_OPP_STATUS,
};
use super::model::{Hendelsetype, InternalDigisosSoker};
use super::pdf::ETTERSENDELSE_PDF;
use super::ports::CachePolicy;
use super::support::{DokumentUrls, unix_to_local_datetime};
use super::{AuthenticatedUser, Error, EventService, FiksService};

/// Files of one vedlegg type from one innsending.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalVedlegg {
    pub type_: String,
    pub tilleggsinfo: Option<String>,
    pub hendelse_type: Option<Hendelsetype>,
    pub hendelse_referanse: Option<String>,
    pub dokument_info_list: Vec<DokumentInfo>,
    pub tidspunkt_lastet_opp: NaiveDateTime,
    pub innsendelsesfrist: Option<NaiveDateTime>,
}

/// One uploaded file as listed for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VedleggResponse {
    pub filnavn: String,
    pub storrelse: i64,
    pub url: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub tilleggsinfo: Option<String>,
    pub dato_lagt_til: NaiveDateTime,
}

#[derive(Clone)]
pub struct VedleggService {
    fiks: FiksService,
    event: EventService,
    urls: DokumentUrls,
}

impl VedleggService {
    pub fn new(fiks: FiksService, event: EventService, urls: DokumentUrls) -> Self {
        Self { fiks, event, urls }
    }

    /// Flat, distinct list of every uploaded file of the sak.
    pub async fn hent_vedlegg(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<VedleggResponse>, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_model(&sak, user).await?;
        let vedlegg = self.hent_alle_opplastede_vedlegg(&sak, &model, user).await?;

        let mut responses: Vec<VedleggResponse> = Vec::new();
        for internal in &vedlegg {
            for dokument in &internal.dokument_info_list {
                let response = VedleggResponse {
                    filnavn: remove_uuid_from_filename(&dokument.filnavn),
                    storrelse: dokument.storrelse,
                    url: self.urls.dokumentlager_url(&dokument.dokumentlager_dokument_id),
                    type_: internal.type_.clone(),
                    tilleggsinfo: internal.tilleggsinfo.clone(),
                    dato_lagt_til: internal.tidspunkt_lastet_opp,
                };
                if !responses.contains(&response) {
                    responses.push(response);
                }
            }
        }
        Ok(responses)
    }

    /// Vedlegg uploaded with the søknad followed by every ettersendelse.
    pub async fn hent_alle_opplastede_vedlegg(
        &self,
        sak: &DigisosSak,
        model: &InternalDigisosSoker,
        user: &AuthenticatedUser,
    ) -> Result<Vec<InternalVedlegg>, Error> {
        let mut vedlegg = self
            .hent_soknad_vedlegg_med_status(LASTET_OPP_STATUS, sak, user)
            .await?;
        vedlegg.extend(self.hent_ettersendte_vedlegg(sak, model, user).await?);
        Ok(vedlegg)
    }

    /// Vedlegg of the original søknad with the given status.
    pub async fn hent_soknad_vedlegg_med_status(
        &self,
        status: &str,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<Vec<InternalVedlegg>, Error> {
        let Some(original) = sak.original_soknad_nav.as_ref() else {
            return Ok(Vec::new());
        };
        let spesifikasjon = self
            .hent_vedlegg_spesifikasjon(sak, &original.vedlegg_metadata, user)
            .await?;
        let tidspunkt = unix_to_local_datetime(original.timestamp_sendt).unwrap_or_default();

        let alle = spesifikasjon
            .vedlegg
            .into_iter()
            .filter(|vedlegg| vedlegg.status == status)
            .map(|vedlegg| {
                let dokumenter = match_dokument_info(&original.vedlegg, &vedlegg.filer);
                internal_vedlegg(vedlegg, dokumenter, tidspunkt, None)
            })
            .collect();
        Ok(kombiner_alle_like_vedlegg(alle))
    }

    /// Vedlegg uploaded through innsyn after the søknad was sent.
    pub async fn hent_ettersendte_vedlegg(
        &self,
        sak: &DigisosSak,
        model: &InternalDigisosSoker,
        user: &AuthenticatedUser,
    ) -> Result<Vec<InternalVedlegg>, Error> {
        let mut alle = Vec::new();
        for ettersendelse in sak.ettersendelser() {
            let spesifikasjon = self
                .hent_vedlegg_spesifikasjon(sak, &ettersendelse.vedlegg_metadata, user)
                .await?;
            alle.extend(vedlegg_fra_ettersendelse(ettersendelse, spesifikasjon, model)?);
        }
        Ok(kombiner_alle_like_vedlegg(alle))
    }

    async fn hent_vedlegg_spesifikasjon(
        &self,
        sak: &DigisosSak,
        dokumentlager_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<JsonVedleggSpesifikasjon, Error> {
        self.fiks
            .hent_dokument(&sak.fiks_digisos_id, dokumentlager_id, None, user)
            .await
    }
}

/// Pair the specification of one ettersendelse with its stored documents.
///
/// Files are matched by position; the generated receipt is skipped.
fn vedlegg_fra_ettersendelse(
    ettersendelse: &Ettersendelse,
    spesifikasjon: JsonVedleggSpesifikasjon,
    model: &InternalDigisosSoker,
) -> Result<Vec<InternalVedlegg>, Error> {
    let dokumenter: Vec<&DokumentInfo> = ettersendelse
        .vedlegg
        .iter()
        .filter(|dokument| dokument.filnavn != ETTERSENDELSE_PDF)
        .collect();
    let tidspunkt = unix_to_local_datetime(ettersendelse.timestamp_sendt).unwrap_or_default();

    let mut fil_index = 0;
    let mut vedlegg_liste = Vec::new();
    for vedlegg in spesifikasjon
        .vedlegg
        .into_iter()
        .filter(|vedlegg| vedlegg.status == LASTET_OPP_STATUS)
    {
        let start = fil_index;
        fil_index += vedlegg.filer.len();
        let dokument_info_list = match dokumenter.get(start..fil_index) {
            Some(matchende) => {
                if !filenames_match(matchende, &vedlegg.filer) {
                    error!(
                        nav_ekstern_ref_id = %ettersendelse.nav_ekstern_ref_id,
                        "mismatch mellom nedlastede filer og metadata"
                    );
                    return Err(Error::fiks("Det er mismatch mellom nedlastede filer og metadata"));
                }
                matchende.iter().map(|dokument| (*dokument).clone()).collect()
            }
            None => {
                error!(
                    filer = fil_index,
                    metadata = dokumenter.len(),
                    "det er flere filer enn vi har metadata"
                );
                vedlegg
                    .filer
                    .iter()
                    .map(|fil| DokumentInfo {
                        filnavn: fil.filnavn.clone(),
                        dokumentlager_dokument_id: "Error".to_owned(),
                        storrelse: -1,
                    })
                    .collect()
            }
        };
        let innsendelsesfrist = innsendelsesfrist_fra_oppgave(model, &vedlegg);
        vedlegg_liste.push(internal_vedlegg(
            vedlegg,
            dokument_info_list,
            tidspunkt,
            innsendelsesfrist,
        ));
    }
    Ok(vedlegg_liste)
}

fn internal_vedlegg(
    vedlegg: JsonVedlegg,
    dokument_info_list: Vec<DokumentInfo>,
    tidspunkt_lastet_opp: NaiveDateTime,
    innsendelsesfrist: Option<NaiveDateTime>,
) -> InternalVedlegg {
    InternalVedlegg {
        type_: vedlegg.type_,
        tilleggsinfo: vedlegg.tilleggsinfo,
        hendelse_type: vedlegg.hendelse_type,
        hendelse_referanse: vedlegg.hendelse_referanse,
        dokument_info_list,
        tidspunkt_lastet_opp,
        innsendelsesfrist,
    }
}

fn match_dokument_info(dokumenter: &[DokumentInfo], filer: &[JsonFiler]) -> Vec<DokumentInfo> {
    filer
        .iter()
        .flat_map(|fil| {
            dokumenter
                .iter()
                .filter(move |dokument| dokument.filnavn == fil.filnavn)
                .cloned()
        })
        .collect()
}

fn filenames_match(dokumenter: &[&DokumentInfo], filer: &[JsonFiler]) -> bool {
    dokumenter.len() == filer.len()
        && dokumenter
            .iter()
            .zip(filer)
            .all(|(dokument, fil)| sanitize_file_name(&dokument.filnavn) == sanitize_file_name(&fil.filnavn))
}

/// Latest frist of an oppgave asking for this vedlegg type.
fn innsendelsesfrist_fra_oppgave(
    model: &InternalDigisosSoker,
    vedlegg: &JsonVedlegg,
) -> Option<NaiveDateTime> {
    model
        .oppgaver
        .iter()
        .filter(|oppgave| oppgave.tittel == vedlegg.type_ && oppgave.tilleggsinfo == vedlegg.tilleggsinfo)
        .max_by_key(|oppgave| oppgave.innsendelsesfrist)
        .and_then(|oppgave| oppgave.innsendelsesfrist)
}

/// Merge vedlegg of the same type uploaded less than a minute apart.
pub fn kombiner_alle_like_vedlegg(alle: Vec<InternalVedlegg>) -> Vec<InternalVedlegg> {
    let mut kombinert: Vec<InternalVedlegg> = Vec::new();
    for vedlegg in alle {
        let funnet = kombinert.iter_mut().find(|eksisterende| {
            (vedlegg.tidspunkt_lastet_opp - eksisterende.tidspunkt_lastet_opp)
                .num_minutes()
                .abs()
                < 1
                && eksisterende.type_ == vedlegg.type_
                && eksisterende.tilleggsinfo == vedlegg.tilleggsinfo
        });
        match funnet {
            Some(eksisterende) => eksisterende
                .dokument_info_list
                .extend(vedlegg.dokument_info_list),
            None => kombinert.push(vedlegg),
        }
    }
    kombinert
}

#[cfg(test)]
mod tests;
