use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonDokumentasjonEtterspurt;
use crate::domain::model::{
    Hendelse, HendelseTekstType, Hendelsetype, InternalDigisosSoker, Oppgave, SoknadsStatus,
    UrlResponse,
};
use crate::domain::support::{DokumentUrls, sha256_hex, to_local_datetime};

impl InternalDigisosSoker {
    /// Replace the open oppgaver with the documents now requested.
    pub(crate) fn apply_dokumentasjon_etterspurt(
        &mut self,
        hendelse: &JsonDokumentasjonEtterspurt,
        urls: &DokumentUrls,
    ) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let antall_for = self.oppgaver.len();

        self.oppgaver = hendelse
            .dokumenter
            .iter()
            .map(|dokument| Oppgave {
                oppgave_id: sha256_hex(dokument.innsendelsesfrist.as_deref().unwrap_or_default()),
                tittel: dokument.dokumenttype.clone(),
                tilleggsinfo: dokument.tilleggsinformasjon.clone(),
                hendelsetype: Some(Hendelsetype::DokumentasjonEtterspurt),
                hendelsereferanse: dokument.dokumentreferanse.clone(),
                innsendelsesfrist: dokument
                    .innsendelsesfrist
                    .as_deref()
                    .and_then(to_local_datetime),
                tidspunkt_for_krav: tid,
                er_fra_innsyn: true,
            })
            .collect();

        if self.status == SoknadsStatus::Ferdigbehandlet && !self.oppgaver.is_empty() {
            warn!("dokumentasjon etterspurt etter at søknaden er ferdigbehandlet");
        }

        if !hendelse.dokumenter.is_empty() {
            if let Some(brev) = hendelse.forvaltningsbrev.as_ref() {
                info!(antall = hendelse.dokumenter.len(), "hendelse: dokumentasjon etterspurt");
                self.historikk.push(
                    Hendelse::new(HendelseTekstType::EttersporMerDokumentasjon, tid)
                        .with_url(Some(UrlResponse::vis_brevet(urls.url_for(&brev.referanse)))),
                );
            }
        }

        let ikke_avsluttet = !matches!(
            self.status,
            SoknadsStatus::Ferdigbehandlet | SoknadsStatus::BehandlesIkke
        );
        if antall_for > 0 && self.oppgaver.is_empty() && ikke_avsluttet {
            self.historikk.push(Hendelse::new(
                HendelseTekstType::EttersporIkkeMerDokumentasjon,
                tid,
            ));
        }
        Ok(())
    }
}
