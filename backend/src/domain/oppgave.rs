//! Oppgaver, vilkår and dokumentasjonkrav still open for the søker.
//!
//! An oppgave counts as answered once an ettersendt vedlegg of the same type
//! and tilleggsinfo was uploaded after the oppgave was requested. The same
//! rule, keyed on tittel and beskrivelse, applies to dokumentasjonkrav.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

use super::digisos::DigisosSak;
use super::model::{
    Dokumentasjonkrav, HendelseTekstType, Hendelsetype, InternalDigisosSoker, Oppgave,
    Oppgavestatus, SoknadsStatus, Vilkar,
};
use super::ports::CachePolicy;
use super::vedlegg::InternalVedlegg;
use super::{AuthenticatedUser, Error, EventService, FiksService, VedleggService};

/// Oppgaver sharing one innsendelsesfrist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OppgaveResponse {
    pub innsendelsesfrist: Option<NaiveDate>,
    pub oppgave_id: String,
    pub oppgave_elementer: Vec<OppgaveElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OppgaveElement {
    pub dokumenttype: String,
    pub tilleggsinformasjon: Option<String>,
    pub hendelsetype: Option<Hendelsetype>,
    pub hendelsereferanse: Option<String>,
    pub er_fra_innsyn: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VilkarResponse {
    pub hendelsetidspunkt: NaiveDate,
    pub vilkar_referanse: String,
    pub tittel: Option<String>,
    pub beskrivelse: Option<String>,
    pub status: Oppgavestatus,
    pub utbetalings_referanse: Vec<String>,
}

/// Dokumentasjonkrav sharing one frist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DokumentasjonkravResponse {
    pub dokumentasjonkrav_id: String,
    pub frist: Option<NaiveDate>,
    pub dokumentasjonkrav_elementer: Vec<DokumentasjonkravElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DokumentasjonkravElement {
    pub hendelsetidspunkt: NaiveDate,
    pub hendelsetype: Hendelsetype,
    pub dokumentasjonkrav_referanse: String,
    pub tittel: Option<String>,
    pub beskrivelse: Option<String>,
    pub status: Oppgavestatus,
    pub utbetalings_referanse: Vec<String>,
}

#[derive(Clone)]
pub struct OppgaveService {
    fiks: FiksService,
    event: EventService,
    vedlegg: VedleggService,
    fagsystem_versjoner: Vec<String>,
}

impl OppgaveService {
    /// `fagsystem_versjoner` holds `navn;versjon` entries naming the first
    /// fagsystem release that publishes vilkår and dokumentasjonkrav.
    pub fn new(
        fiks: FiksService,
        event: EventService,
        vedlegg: VedleggService,
        fagsystem_versjoner: Vec<String>,
    ) -> Self {
        Self {
            fiks,
            event,
            vedlegg,
            fagsystem_versjoner,
        }
    }

    pub async fn hent_oppgaver(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<OppgaveResponse>, Error> {
        let (sak, model) = self.hent_model(fiks_digisos_id, user).await?;
        if model.status == SoknadsStatus::Ferdigbehandlet || model.oppgaver.is_empty() {
            return Ok(Vec::new());
        }
        let ettersendte = self
            .vedlegg
            .hent_ettersendte_vedlegg(&sak, &model, user)
            .await?;
        let oppgaver = oppgaver(&model, &ettersendte);
        info!(
            antall = oppgaver.iter().map(|o| o.oppgave_elementer.len()).sum::<usize>(),
            "hentet oppgaver"
        );
        Ok(oppgaver)
    }

    pub async fn hent_oppgaver_med_oppgave_id(
        &self,
        fiks_digisos_id: &str,
        oppgave_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<OppgaveResponse>, Error> {
        let mut oppgaver = self.hent_oppgaver(fiks_digisos_id, user).await?;
        oppgaver.retain(|oppgave| oppgave.oppgave_id == oppgave_id);
        Ok(oppgaver)
    }

    pub async fn get_vilkar(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<VilkarResponse>, Error> {
        let (_, model) = self.hent_model(fiks_digisos_id, user).await?;
        let vilkar = vilkar(&model);
        info!(antall = vilkar.len(), "hentet vilkår");
        Ok(vilkar)
    }

    pub async fn get_dokumentasjonkrav(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<DokumentasjonkravResponse>, Error> {
        let (sak, model) = self.hent_model(fiks_digisos_id, user).await?;
        if model.dokumentasjonkrav.is_empty() {
            return Ok(Vec::new());
        }
        let ettersendte = self
            .vedlegg
            .hent_ettersendte_vedlegg(&sak, &model, user)
            .await?;
        let krav = dokumentasjonkrav(&model, &ettersendte);
        info!(
            antall = krav
                .iter()
                .map(|k| k.dokumentasjonkrav_elementer.len())
                .sum::<usize>(),
            "hentet dokumentasjonkrav"
        );
        Ok(krav)
    }

    pub async fn get_dokumentasjonkrav_med_id(
        &self,
        fiks_digisos_id: &str,
        dokumentasjonkrav_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<DokumentasjonkravResponse>, Error> {
        let mut krav = self.get_dokumentasjonkrav(fiks_digisos_id, user).await?;
        krav.retain(|krav| krav.dokumentasjonkrav_id == dokumentasjonkrav_id);
        Ok(krav)
    }

    /// True when at least one dokumentasjonkrav has been answered.
    pub async fn get_har_levert_dokumentasjonkrav(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<bool, Error> {
        let (sak, model) = self.hent_model(fiks_digisos_id, user).await?;
        if model.dokumentasjonkrav.is_empty() {
            return Ok(false);
        }
        let ettersendte = self
            .vedlegg
            .hent_ettersendte_vedlegg(&sak, &model, user)
            .await?;
        Ok(model
            .dokumentasjonkrav
            .iter()
            .filter(|krav| !krav_er_tomt(krav))
            .any(|krav| krav_er_levert(krav, &ettersendte)))
    }

    pub async fn get_fagsystem_har_vilkar_og_dokumentasjonkrav(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<bool, Error> {
        let (_, model) = self.hent_model(fiks_digisos_id, user).await?;
        let Some(fagsystem) = model.fagsystem.as_ref() else {
            return Ok(false);
        };
        let (Some(navn), Some(versjon)) = (
            fagsystem.systemnavn.as_deref(),
            fagsystem.systemversjon.as_deref(),
        ) else {
            return Ok(false);
        };
        Ok(fagsystem_stotter_vilkar(&self.fagsystem_versjoner, navn, versjon))
    }

    /// Paper søknader are MOTTATT without ever having been sent through NAV.
    pub async fn sak_har_status_mottatt_og_ikke_hatt_sendt(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<bool, Error> {
        let (_, model) = self.hent_model(fiks_digisos_id, user).await?;
        Ok(model.status == SoknadsStatus::Mottatt
            && !model
                .historikk
                .iter()
                .any(|hendelse| hendelse.hendelse_type == HendelseTekstType::SoknadSendTilKontor))
    }

    async fn hent_model(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<(DigisosSak, InternalDigisosSoker), Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_model(&sak, user).await?;
        Ok((sak, model))
    }
}

/// Open oppgaver grouped by frist date, earliest first and undated first.
pub(crate) fn oppgaver(
    model: &InternalDigisosSoker,
    ettersendte: &[InternalVedlegg],
) -> Vec<OppgaveResponse> {
    let mut grupper: Vec<OppgaveResponse> = Vec::new();
    for oppgave in model
        .oppgaver
        .iter()
        .filter(|oppgave| !oppgave_er_levert(oppgave, ettersendte))
    {
        let frist = oppgave.innsendelsesfrist.map(|frist| frist.date());
        let element = OppgaveElement {
            dokumenttype: oppgave.tittel.clone(),
            tilleggsinformasjon: oppgave.tilleggsinfo.clone(),
            hendelsetype: oppgave.hendelsetype,
            hendelsereferanse: oppgave.hendelsereferanse.clone(),
            er_fra_innsyn: oppgave.er_fra_innsyn,
        };
        match grupper
            .iter_mut()
            .find(|gruppe| gruppe.innsendelsesfrist == frist)
        {
            Some(gruppe) => gruppe.oppgave_elementer.push(element),
            None => grupper.push(OppgaveResponse {
                innsendelsesfrist: frist,
                oppgave_id: oppgave.oppgave_id.clone(),
                oppgave_elementer: vec![element],
            }),
        }
    }
    grupper.sort_by_key(|gruppe| gruppe.innsendelsesfrist);
    grupper
}

/// Relevant vilkår ordered by the day they were added.
pub(crate) fn vilkar(model: &InternalDigisosSoker) -> Vec<VilkarResponse> {
    let mut vilkar: Vec<VilkarResponse> = model
        .vilkar
        .iter()
        .filter(|vilkar| !vilkar_er_tomt(vilkar))
        .filter(|vilkar| vilkar.status == Oppgavestatus::Relevant)
        .map(|vilkar| {
            let (tittel, beskrivelse) = vilkar.tittel_og_beskrivelse();
            VilkarResponse {
                hendelsetidspunkt: vilkar.dato_lagt_til.date(),
                vilkar_referanse: vilkar.referanse.clone(),
                tittel,
                beskrivelse,
                status: vilkar.status,
                utbetalings_referanse: vilkar.utbetalingsreferanser.clone(),
            }
        })
        .collect();
    vilkar.sort_by_key(|vilkar| vilkar.hendelsetidspunkt);
    vilkar
}

/// Relevant, unanswered dokumentasjonkrav grouped by frist, undated last.
pub(crate) fn dokumentasjonkrav(
    model: &InternalDigisosSoker,
    ettersendte: &[InternalVedlegg],
) -> Vec<DokumentasjonkravResponse> {
    let mut grupper: Vec<DokumentasjonkravResponse> = Vec::new();
    for krav in model
        .dokumentasjonkrav
        .iter()
        .filter(|krav| !krav_er_tomt(krav))
        .filter(|krav| !krav_er_levert(krav, ettersendte))
        .filter(|krav| krav.status == Oppgavestatus::Relevant)
    {
        let (tittel, beskrivelse) = krav.tittel_og_beskrivelse();
        let element = DokumentasjonkravElement {
            hendelsetidspunkt: krav.dato_lagt_til.date(),
            hendelsetype: Hendelsetype::Dokumentasjonkrav,
            dokumentasjonkrav_referanse: krav.referanse.clone(),
            tittel,
            beskrivelse,
            status: krav.status,
            utbetalings_referanse: krav.utbetalingsreferanser.clone(),
        };
        match grupper.iter_mut().find(|gruppe| gruppe.frist == krav.frist) {
            Some(gruppe) => gruppe.dokumentasjonkrav_elementer.push(element),
            None => grupper.push(DokumentasjonkravResponse {
                dokumentasjonkrav_id: krav.dokumentasjonkrav_id.clone(),
                frist: krav.frist,
                dokumentasjonkrav_elementer: vec![element],
            }),
        }
    }
    grupper.sort_by(|a, b| nulls_last(a.frist, b.frist));
    grupper
}

fn nulls_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn oppgave_er_levert(oppgave: &Oppgave, ettersendte: &[InternalVedlegg]) -> bool {
    lastet_opp_etter(
        ettersendte,
        &oppgave.tittel,
        oppgave.tilleggsinfo.as_deref(),
        Some(oppgave.tidspunkt_for_krav),
    )
}

fn krav_er_levert(krav: &Dokumentasjonkrav, ettersendte: &[InternalVedlegg]) -> bool {
    let Some(tittel) = krav.tittel.as_deref() else {
        return false;
    };
    let grense = krav.frist.map(|_| krav.dato_lagt_til);
    lastet_opp_etter(ettersendte, tittel, krav.beskrivelse.as_deref(), grense)
}

/// Any matching vedlegg counts when `grense` is `None`.
fn lastet_opp_etter(
    ettersendte: &[InternalVedlegg],
    type_: &str,
    tilleggsinfo: Option<&str>,
    grense: Option<NaiveDateTime>,
) -> bool {
    ettersendte
        .iter()
        .filter(|vedlegg| vedlegg.type_ == type_)
        .filter(|vedlegg| vedlegg.tilleggsinfo.as_deref() == tilleggsinfo)
        .any(|vedlegg| grense.is_none_or(|grense| vedlegg.tidspunkt_lastet_opp > grense))
}

fn vilkar_er_tomt(vilkar: &Vilkar) -> bool {
    let tomt = vilkar.is_empty();
    if tomt {
        error!(referanse = %vilkar.referanse, "tittel og beskrivelse på vilkår er tomt");
    }
    tomt
}

fn krav_er_tomt(krav: &Dokumentasjonkrav) -> bool {
    let tomt = krav.is_empty();
    if tomt {
        error!(referanse = %krav.referanse, "tittel og beskrivelse på dokumentasjonkrav er tomt");
    }
    tomt
}

fn fagsystem_stotter_vilkar(godkjente: &[String], navn: &str, versjon: &str) -> bool {
    godkjente
        .iter()
        .filter_map(|entry| match entry.split_once(';') {
            Some(pair) => Some(pair),
            None => {
                error!(entry = %entry, "kan ikke splitte fagsystem-versjon i konfigurasjonen");
                None
            }
        })
        .filter(|(godkjent_navn, _)| *godkjent_navn == navn)
        .any(|(_, godkjent_versjon)| {
            match (parse_versjon(versjon), parse_versjon(godkjent_versjon)) {
                (Some(avsender), Some(godkjent)) => avsender >= godkjent,
                _ => false,
            }
        })
}

/// `major.minor.patch` with trailing qualifiers ignored and missing parts as 0.
fn parse_versjon(raw: &str) -> Option<[u32; 3]> {
    let mut deler = raw.trim().split('.');
    let mut versjon = [0_u32; 3];
    for (index, plass) in versjon.iter_mut().enumerate() {
        let Some(del) = deler.next() else {
            break;
        };
        let siffer: String = del.chars().take_while(char::is_ascii_digit).collect();
        match siffer.parse() {
            Ok(tall) => *plass = tall,
            Err(_) if index == 0 => return None,
            Err(_) => break,
        }
    }
    Some(versjon)
}
