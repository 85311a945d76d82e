//! Event fold rebuilding [`InternalDigisosSoker`] from the innsyn document.
//!
//! The kommune fagsystem publishes an append-only list of hendelser. Every
//! request replays them in order on a fresh aggregate. Each hendelse type has
//! its own handler module operating on the aggregate; [`EventService`] owns
//! the I/O around the fold.

mod dokumentasjon_etterspurt;
mod dokumentasjonkrav;
mod forelopig_svar;
mod saks_status;
mod soknads_status;
mod tildelt_nav_kontor;
mod utbetaling;
mod vedtak_fattet;
mod vilkar;

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mockable::Clock;
use tracing::{debug, error, info, warn};

use super::digisos::{
    DigisosSak, JsonDigisosSoker, JsonHendelse, JsonSoknad,
    JsonVedleggSpesifikasjon, VEDLEGG_KREVES_STATUS,
};
use super::model::{
    Fagsystem, Hendelse, HendelseTekstType, Hendelsetype, InternalDigisosSoker, Oppgave,
    SaksStatus, SoknadsStatus, Soknadsmottaker, UrlResponse,
};
use super::ports::NorgClient;
use super::support::{
    DokumentUrls, now_local, sha256_hex, strip_enhetsnavn_for_kommune, to_local_datetime,
    unix_to_local_datetime,
};
use super::{AuthenticatedUser, Error, FiksService, KommuneService};

/// Builds read models for one digisos sak.
#[derive(Clone)]
pub struct EventService {
    fiks: FiksService,
    kommune: KommuneService,
    norg: Arc<dyn NorgClient>,
    urls: DokumentUrls,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(
        fiks: FiksService,
        kommune: KommuneService,
        norg: Arc<dyn NorgClient>,
        urls: DokumentUrls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fiks,
            kommune,
            norg,
            urls,
            clock,
        }
    }

    /// Full model used by the detail endpoints.
    pub async fn create_model(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<InternalDigisosSoker, Error> {
        let json_digisos_soker = self.hent_json_digisos_soker(sak, user).await?;
        let json_soknad = self.hent_original_soknad(sak, user).await?;

        let mut model = InternalDigisosSoker::default();
        if let Some(avsender) = json_digisos_soker.as_ref().and_then(|doc| doc.avsender.as_ref()) {
            model.fagsystem = Some(Fagsystem {
                systemnavn: avsender.systemnavn.clone(),
                systemversjon: avsender.systemversjon.clone(),
            });
        }

        if let Some(original) = sak.original_soknad_nav.as_ref() {
            model.status = SoknadsStatus::Sendt;
            if original.timestamp_sendt == 0 {
                error!(fiks_digisos_id = %sak.fiks_digisos_id, "Søknadens timestampSendt er 0");
            } else {
                model.tidspunkt_sendt = unix_to_local_datetime(original.timestamp_sendt);
            }
            model.referanse = Some(original.nav_ekstern_ref_id.clone());
            model.fiks_digisos_id = Some(sak.fiks_digisos_id.clone());

            if let Some(mottaker) = json_soknad.and_then(|soknad| soknad.mottaker) {
                let tekst_argument = mottaker
                    .nav_enhetsnavn
                    .as_deref()
                    .map(strip_enhetsnavn_for_kommune);
                model.soknadsmottaker = Some(Soknadsmottaker {
                    nav_enhetsnummer: mottaker.enhetsnummer,
                    nav_enhetsnavn: mottaker.nav_enhetsnavn,
                });
                let url = UrlResponse {
                    link_tekst: HendelseTekstType::SoknadSendTilKontorLenketekst,
                    link: self
                        .urls
                        .dokumentlager_url(&original.soknad_dokument.dokumentlager_dokument_id),
                };
                model.historikk.push(
                    Hendelse::new(
                        HendelseTekstType::SoknadSendTilKontor,
                        unix_to_local_datetime(original.timestamp_sendt).unwrap_or_default(),
                    )
                    .with_url(Some(url))
                    .with_tekst_argument(tekst_argument),
                );
            }
        }

        self.apply_hendelser_og_soknad_krav(json_digisos_soker.as_ref(), &mut model, sak, user)
            .await?;
        Ok(model)
    }

    /// Lighter model used for the saksoversikt.
    pub async fn create_saksoversikt_model(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<InternalDigisosSoker, Error> {
        let json_digisos_soker = self.hent_json_digisos_soker(sak, user).await?;
        let mut model = InternalDigisosSoker::default();
        if sak.original_soknad_nav.is_some() {
            model.status = SoknadsStatus::Sendt;
        }
        self.apply_hendelser_og_soknad_krav(json_digisos_soker.as_ref(), &mut model, sak, user)
            .await?;
        self.log_utbetalinger_paa_overtid(json_digisos_soker.as_ref(), &model, sak);
        Ok(model)
    }

    /// Model holding only the utbetalinger of a sak.
    pub async fn hent_alle_utbetalinger(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<InternalDigisosSoker, Error> {
        let mut model = InternalDigisosSoker {
            fiks_digisos_id: Some(sak.fiks_digisos_id.clone()),
            ..InternalDigisosSoker::default()
        };
        let Some(json_digisos_soker) = self.hent_json_digisos_soker(sak, user).await? else {
            return Ok(model);
        };
        let mut utbetalinger: Vec<&JsonHendelse> = json_digisos_soker
            .hendelser
            .iter()
            .filter(|hendelse| matches!(hendelse, JsonHendelse::Utbetaling(_)))
            .collect();
        sorter_hendelser(&mut utbetalinger);
        for hendelse in utbetalinger {
            if let JsonHendelse::Utbetaling(utbetaling) = hendelse {
                model.apply_utbetaling(utbetaling)?;
            }
        }
        Ok(model)
    }

    /// Innsyn document, skipped when the kommune has innsyn deactivated.
    pub async fn hent_json_digisos_soker(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<Option<JsonDigisosSoker>, Error> {
        let Some(digisos_soker) = sak.digisos_soker.as_ref() else {
            return Ok(None);
        };
        if self.kommune.er_innsyn_deaktivert_for_kommune(sak).await? {
            debug!(kommunenummer = %sak.kommunenummer, "kommune har deaktivert innsyn, henter ikke innsynsdata");
            return Ok(None);
        }
        self.fiks
            .hent_dokument(
                &sak.fiks_digisos_id,
                &digisos_soker.metadata,
                Some(digisos_soker.timestamp_sist_oppdatert),
                user,
            )
            .await
            .map(Some)
    }

    async fn hent_original_soknad(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<Option<JsonSoknad>, Error> {
        let Some(original) = sak.original_soknad_nav.as_ref() else {
            return Ok(None);
        };
        self.fiks
            .hent_dokument(&sak.fiks_digisos_id, &original.metadata, None, user)
            .await
            .map(Some)
    }

    async fn apply_hendelser_og_soknad_krav(
        &self,
        json_digisos_soker: Option<&JsonDigisosSoker>,
        model: &mut InternalDigisosSoker,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<(), Error> {
        let mut hendelser: Vec<&JsonHendelse> = json_digisos_soker
            .map(|doc| doc.hendelser.iter().collect())
            .unwrap_or_default();
        sorter_hendelser(&mut hendelser);

        let is_papir_soknad = sak.is_papir_soknad();
        for hendelse in hendelser {
            self.apply_hendelse(model, hendelse, is_papir_soknad).await?;
        }

        let ingen_dokumentasjon_etterspurt = json_digisos_soker.is_none_or(|doc| {
            !doc.hendelser
                .iter()
                .any(|hendelse| matches!(hendelse, JsonHendelse::DokumentasjonEtterspurt(_)))
        });
        if let Some(original) = sak.original_soknad_nav.as_ref() {
            let sendt = unix_to_local_datetime(original.timestamp_sendt).unwrap_or_default();
            let grense = now_local(self.clock.as_ref()).date() - Duration::days(30);
            if ingen_dokumentasjon_etterspurt && sendt.date() > grense {
                let spesifikasjon: JsonVedleggSpesifikasjon = self
                    .fiks
                    .hent_dokument(&sak.fiks_digisos_id, &original.vedlegg_metadata, None, user)
                    .await?;
                model.apply_soknad_krav(&spesifikasjon, sendt);
            }
        }

        model.override_status_if_active_saker_exist();
        Ok(())
    }

    async fn apply_hendelse(
        &self,
        model: &mut InternalDigisosSoker,
        hendelse: &JsonHendelse,
        is_papir_soknad: bool,
    ) -> Result<(), Error> {
        match hendelse {
            JsonHendelse::SoknadsStatus(h) => model.apply_soknads_status(h),
            JsonHendelse::TildeltNavKontor(h) => {
                let navn = if model.trenger_norg_oppslag(h) {
                    self.hent_nav_enhetsnavn(&h.nav_kontor).await
                } else {
                    None
                };
                model.apply_tildelt_nav_kontor(h, navn, is_papir_soknad)
            }
            JsonHendelse::SaksStatus(h) => model.apply_saks_status(h),
            JsonHendelse::VedtakFattet(h) => model.apply_vedtak_fattet(h, &self.urls),
            JsonHendelse::DokumentasjonEtterspurt(h) => {
                model.apply_dokumentasjon_etterspurt(h, &self.urls)
            }
            JsonHendelse::ForelopigSvar(h) => model.apply_forelopig_svar(h, &self.urls),
            JsonHendelse::Utbetaling(h) => model.apply_utbetaling(h),
            JsonHendelse::Vilkar(h) => model.apply_vilkar(h),
            JsonHendelse::Dokumentasjonkrav(h) => model.apply_dokumentasjonkrav(h),
            JsonHendelse::Rammevedtak(_) => Ok(()),
            JsonHendelse::Unknown => {
                error!("hendelsetype mangler mapping");
                Err(Error::unexpected("Hendelsetype mangler mapping"))
            }
        }
    }

    async fn hent_nav_enhetsnavn(&self, enhetsnr: &str) -> Option<String> {
        match self.norg.hent_nav_enhet(enhetsnr).await {
            Ok(enhet) => Some(enhet.navn),
            Err(err) => {
                warn!(enhetsnr, error = %err, "feil ved henting av NAV-enhet fra NORG");
                None
            }
        }
    }

    fn log_utbetalinger_paa_overtid(
        &self,
        json_digisos_soker: Option<&JsonDigisosSoker>,
        model: &InternalDigisosSoker,
        sak: &DigisosSak,
    ) {
        let idag = now_local(self.clock.as_ref()).date();
        let igaar = idag - Duration::days(1);
        let hendelser = json_digisos_soker.map(|doc| doc.hendelser.as_slice()).unwrap_or_default();
        for utbetaling in &model.utbetalinger {
            let Some(forfallsdato) = utbetaling.forfallsdato else {
                continue;
            };
            if forfallsdato >= igaar {
                continue;
            }
            let sluttdato = utbetaling
                .utbetalingsdato
                .or(utbetaling.stoppetdato)
                .unwrap_or(idag);
            let opprettelsesdato = opprettelsesdato(hendelser, &utbetaling.referanse, idag);
            let startdato = forfallsdato.max(opprettelsesdato);
            let overdue_days = (sluttdato - startdato).num_days();
            info!(
                referanse = %utbetaling.referanse,
                digisos_id = %sak.fiks_digisos_id,
                status = ?utbetaling.status,
                tilbakevirkende = opprettelsesdato > forfallsdato,
                overdue_days,
                forfallsdato = %forfallsdato,
                kommunenummer = %sak.kommunenummer,
                "Utbetaling på overtid"
            );
        }
    }
}

/// Date of the first utbetaling hendelse for `referanse`, capped at `idag`.
fn opprettelsesdato(hendelser: &[JsonHendelse], referanse: &str, idag: NaiveDate) -> NaiveDate {
    hendelser
        .iter()
        .filter_map(|hendelse| match hendelse {
            JsonHendelse::Utbetaling(utbetaling) if utbetaling.utbetalingsreferanse == referanse => {
                to_local_datetime(&utbetaling.hendelsestidspunkt).map(|tid| tid.date())
            }
            _ => None,
        })
        .fold(idag, NaiveDate::min)
}

impl InternalDigisosSoker {
    /// Turn vedlegg the søker promised to send into oppgaver.
    fn apply_soknad_krav(&mut self, spesifikasjon: &JsonVedleggSpesifikasjon, sendt: NaiveDateTime) {
        let oppgave_id = sha256_hex("");
        self.oppgaver.extend(
            spesifikasjon
                .vedlegg
                .iter()
                .filter(|vedlegg| vedlegg.status == VEDLEGG_KREVES_STATUS)
                .map(|vedlegg| Oppgave {
                    oppgave_id: oppgave_id.clone(),
                    tittel: vedlegg.type_.clone(),
                    tilleggsinfo: vedlegg.tilleggsinfo.clone(),
                    hendelsetype: Some(Hendelsetype::Soknad),
                    hendelsereferanse: None,
                    innsendelsesfrist: None,
                    tidspunkt_for_krav: sendt,
                    er_fra_innsyn: false,
                }),
        );
    }

    /// Keep oppgaver from new saker visible after the søknad is ferdigbehandlet.
    fn override_status_if_active_saker_exist(&mut self) {
        if self.status != SoknadsStatus::Ferdigbehandlet {
            return;
        }
        let har_aktive_saker = self.saker.iter().any(|sak| {
            sak.vedtak.is_empty() && sak.saks_status == Some(SaksStatus::UnderBehandling)
        });
        if har_aktive_saker {
            info!("overstyrer søknadsstatus fra FERDIGBEHANDLET til UNDER_BEHANDLING på grunn av aktive saker");
            self.status = SoknadsStatus::UnderBehandling;
        }
    }
}

/// Parse a hendelsestidspunkt into Norwegian local time.
pub(crate) fn tidspunkt(raw: &str) -> Result<NaiveDateTime, Error> {
    to_local_datetime(raw).ok_or_else(|| {
        error!(hendelsestidspunkt = raw, "ugyldig hendelsestidspunkt");
        Error::unexpected("Ugyldig hendelsestidspunkt")
    })
}

/// Sort stably on hendelsestidspunkt.
///
/// At equal time an utbetaling goes before vilkår and dokumentasjonkrav, and a
/// MOTTATT søknadsstatus before UNDER_BEHANDLING. Other ties keep input order.
fn sorter_hendelser(hendelser: &mut [&JsonHendelse]) {
    hendelser.sort_by_key(|hendelse| to_local_datetime(hendelse.hendelsestidspunkt()));
    // The tie rules are not transitive, so they are applied by insertion.
    for i in 1..hendelser.len() {
        let mut j = i;
        while j > 0 && compare_hendelser(hendelser[j - 1], hendelser[j]) == Ordering::Greater {
            hendelser.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn compare_hendelser(a: &JsonHendelse, b: &JsonHendelse) -> Ordering {
    to_local_datetime(a.hendelsestidspunkt())
        .cmp(&to_local_datetime(b.hendelsestidspunkt()))
        .then_with(|| compare_type(a, b))
        .then_with(|| mottatt_before_under_behandling(a, b))
}

fn compare_type(a: &JsonHendelse, b: &JsonHendelse) -> Ordering {
    let er_krav = |hendelse: &JsonHendelse| {
        matches!(
            hendelse,
            JsonHendelse::Vilkar(_) | JsonHendelse::Dokumentasjonkrav(_)
        )
    };
    match (a, b) {
        (JsonHendelse::Utbetaling(_), other) if er_krav(other) => Ordering::Less,
        (other, JsonHendelse::Utbetaling(_)) if er_krav(other) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn mottatt_before_under_behandling(a: &JsonHendelse, b: &JsonHendelse) -> Ordering {
    let (JsonHendelse::SoknadsStatus(a), JsonHendelse::SoknadsStatus(b)) = (a, b) else {
        return Ordering::Equal;
    };
    match (a.status, b.status) {
        (SoknadsStatus::Mottatt, SoknadsStatus::UnderBehandling) => Ordering::Less,
        (SoknadsStatus::UnderBehandling, SoknadsStatus::Mottatt) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
