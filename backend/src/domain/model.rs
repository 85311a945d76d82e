//! Transient read model rebuilt from the Fiks hendelse list on every request.
//!
//! [`InternalDigisosSoker`] is never persisted. The event fold in
//! [`crate::domain::event`] mutates it and the services project it into
//! response DTOs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tittel used for saker created implicitly by a vedtak without saksreferanse.
pub const DEFAULT_SAK_TITTEL: &str = "default_sak_tittel";

/// Referanse of the implicit sak.
pub const DEFAULT_SAK_REFERANSE: &str = "default";

/// Aggregate state of one digisos sak.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InternalDigisosSoker {
    pub referanse: Option<String>,
    pub status: SoknadsStatus,
    pub saker: Vec<Sak>,
    pub utbetalinger: Vec<Utbetaling>,
    pub vilkar: Vec<Vilkar>,
    pub dokumentasjonkrav: Vec<Dokumentasjonkrav>,
    pub soknadsmottaker: Option<Soknadsmottaker>,
    pub tildelt_nav_kontor: Option<String>,
    pub oppgaver: Vec<Oppgave>,
    pub historikk: Vec<Hendelse>,
    pub forelopig_svar: ForelopigSvar,
    pub tidspunkt_sendt: Option<NaiveDateTime>,
    pub fiks_digisos_id: Option<String>,
    pub fagsystem: Option<Fagsystem>,
}

impl InternalDigisosSoker {
    /// Saker that are not registered in error.
    pub fn aktive_saker(&self) -> impl Iterator<Item = &Sak> {
        self.saker
            .iter()
            .filter(|sak| sak.saks_status != Some(SaksStatus::Feilregistrert))
    }

    /// Titles of the active saker joined for display, or the default tittel.
    pub fn saks_titler(&self) -> String {
        let titler: Vec<&str> = self
            .aktive_saker()
            .filter_map(|sak| sak.tittel.as_deref())
            .collect();
        if titler.is_empty() {
            DEFAULT_SAK_TITTEL.to_owned()
        } else {
            titler.join(", ")
        }
    }
}

/// Overall status of the søknad.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoknadsStatus {
    #[default]
    Sendt,
    Mottatt,
    UnderBehandling,
    Ferdigbehandlet,
    BehandlesIkke,
}

/// Status of one sak within the søknad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaksStatus {
    UnderBehandling,
    IkkeInnsyn,
    Ferdigbehandlet,
    BehandlesIkke,
    Feilregistrert,
}

/// Status of one utbetaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UtbetalingsStatus {
    PlanlagtUtbetaling,
    Utbetalt,
    Stoppet,
    Annullert,
}

/// Outcome of a vedtak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UtfallVedtak {
    Innvilget,
    DelvisInnvilget,
    Avslatt,
    Avvist,
}

/// Status shared by vilkår and dokumentasjonkrav.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Oppgavestatus {
    Relevant,
    Annullert,
    Oppfylt,
    IkkeOppfylt,
    LevertTidligere,
}

/// Origin of an oppgave, mirrored in the uploaded vedlegg specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Hendelsetype {
    Soknad,
    Bruker,
    DokumentasjonEtterspurt,
    Dokumentasjonkrav,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sak {
    pub referanse: String,
    pub saks_status: Option<SaksStatus>,
    pub tittel: Option<String>,
    pub vedtak: Vec<Vedtak>,
    pub utbetalinger: Vec<Utbetaling>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vedtak {
    pub id: String,
    pub utfall: Option<UtfallVedtak>,
    pub vedtaks_fil_url: String,
    pub dato: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utbetaling {
    pub referanse: String,
    pub status: UtbetalingsStatus,
    pub belop: f64,
    pub beskrivelse: Option<String>,
    pub forfallsdato: Option<NaiveDate>,
    pub utbetalingsdato: Option<NaiveDate>,
    pub stoppetdato: Option<NaiveDate>,
    pub fom: Option<NaiveDate>,
    pub tom: Option<NaiveDate>,
    pub mottaker: Option<String>,
    pub annen_mottaker: bool,
    pub kontonummer: Option<String>,
    pub utbetalingsmetode: Option<String>,
    pub vilkar: Vec<Vilkar>,
    pub dokumentasjonkrav: Vec<Dokumentasjonkrav>,
    pub dato_hendelse: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vilkar {
    pub referanse: String,
    pub tittel: Option<String>,
    pub beskrivelse: Option<String>,
    pub status: Oppgavestatus,
    pub dato_lagt_til: NaiveDateTime,
    pub dato_sist_endret: NaiveDateTime,
    pub utbetalingsreferanser: Vec<String>,
}

impl Vilkar {
    /// Tittel to display, falling back to the beskrivelse when blank.
    pub fn tittel_og_beskrivelse(&self) -> (Option<String>, Option<String>) {
        tittel_og_beskrivelse(self.tittel.as_deref(), self.beskrivelse.as_deref())
    }

    /// True when neither tittel nor beskrivelse carries text.
    pub fn is_empty(&self) -> bool {
        is_blank(self.tittel.as_deref()) && is_blank(self.beskrivelse.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dokumentasjonkrav {
    pub dokumentasjonkrav_id: String,
    pub referanse: String,
    pub tittel: Option<String>,
    pub beskrivelse: Option<String>,
    pub status: Oppgavestatus,
    pub dato_lagt_til: NaiveDateTime,
    pub dato_sist_endret: NaiveDateTime,
    pub frist: Option<NaiveDate>,
    pub utbetalingsreferanser: Vec<String>,
}

impl Dokumentasjonkrav {
    /// Tittel to display, falling back to the beskrivelse when blank.
    pub fn tittel_og_beskrivelse(&self) -> (Option<String>, Option<String>) {
        tittel_og_beskrivelse(self.tittel.as_deref(), self.beskrivelse.as_deref())
    }

    /// True when neither tittel nor beskrivelse carries text.
    pub fn is_empty(&self) -> bool {
        is_blank(self.tittel.as_deref()) && is_blank(self.beskrivelse.as_deref())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|text| text.trim().is_empty())
}

fn tittel_og_beskrivelse(
    tittel: Option<&str>,
    beskrivelse: Option<&str>,
) -> (Option<String>, Option<String>) {
    if is_blank(tittel) {
        (beskrivelse.map(str::to_owned), None)
    } else {
        (tittel.map(str::to_owned), beskrivelse.map(str::to_owned))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Oppgave {
    pub oppgave_id: String,
    pub tittel: String,
    pub tilleggsinfo: Option<String>,
    pub hendelsetype: Option<Hendelsetype>,
    pub hendelsereferanse: Option<String>,
    pub innsendelsesfrist: Option<NaiveDateTime>,
    pub tidspunkt_for_krav: NaiveDateTime,
    pub er_fra_innsyn: bool,
}

/// Marks historikk entries produced by specific hendelser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorikkType {
    TildeltNavKontor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hendelse {
    pub hendelse_type: HendelseTekstType,
    pub tidspunkt: NaiveDateTime,
    pub url: Option<UrlResponse>,
    pub tekst_argument: Option<String>,
    pub historikk_type: Option<HistorikkType>,
    pub saks_referanse: Option<String>,
}

impl Hendelse {
    pub fn new(hendelse_type: HendelseTekstType, tidspunkt: NaiveDateTime) -> Self {
        Self {
            hendelse_type,
            tidspunkt,
            url: None,
            tekst_argument: None,
            historikk_type: None,
            saks_referanse: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: Option<UrlResponse>) -> Self {
        self.url = url;
        self
    }

    #[must_use]
    pub fn with_tekst_argument(mut self, argument: Option<String>) -> Self {
        self.tekst_argument = argument;
        self
    }

    #[must_use]
    pub fn with_saks_referanse(mut self, referanse: Option<String>) -> Self {
        self.saks_referanse = referanse;
        self
    }

    #[must_use]
    pub fn with_historikk_type(mut self, historikk_type: HistorikkType) -> Self {
        self.historikk_type = Some(historikk_type);
        self
    }
}

/// Link attached to a hendelse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrlResponse {
    pub link_tekst: HendelseTekstType,
    pub link: String,
}

impl UrlResponse {
    pub fn vis_brevet(link: impl Into<String>) -> Self {
        Self {
            link_tekst: HendelseTekstType::VisBrevetLenketekst,
            link: link.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForelopigSvar {
    pub har_mottatt_forelopig_svar: bool,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soknadsmottaker {
    pub nav_enhetsnummer: Option<String>,
    pub nav_enhetsnavn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fagsystem {
    pub systemnavn: Option<String>,
    pub systemversjon: Option<String>,
}

/// Text keys the frontend resolves into localised hendelse texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HendelseTekstType {
    SoknadSendTilKontor,
    SoknadMottattMedKommunenavn,
    SoknadMottattUtenKommunenavn,
    SoknadUnderBehandling,
    SoknadFerdigbehandlet,
    SoknadBehandlesIkke,
    SoknadVideresendtPapirsoknadMedNorgEnhet,
    SoknadVideresendtPapirsoknadUtenNorgEnhet,
    SoknadVideresendtMedNorgEnhet,
    SoknadVideresendtUtenNorgEnhet,
    SoknadKanIkkeViseStatusMedTittel,
    SoknadKanIkkeViseStatusUtenTittel,
    SakUnderBehandlingMedTittel,
    SakUnderBehandlingUtenTittel,
    SakFerdigbehandletMedTittel,
    SakFerdigbehandletUtenTittel,
    SakKanIkkeViseStatusMedTittel,
    SakKanIkkeViseStatusUtenTittel,
    AntallSendteVedlegg,
    UtbetalingerOppdatert,
    #[serde(rename = "BREV_OM_SAKSBEANDLINGSTID")]
    BrevOmSaksbehandlingstid,
    EttersporMerDokumentasjon,
    EttersporIkkeMerDokumentasjon,
    Dokumentasjonkrav,
    VilkarOppdatert,
    VisBrevetLenketekst,
    SoknadSendTilKontorLenketekst,
}

impl HendelseTekstType {
    /// Wire name of the text key.
    pub fn name(self) -> &'static str {
        match self {
            Self::SoknadSendTilKontor => "SOKNAD_SEND_TIL_KONTOR",
            Self::SoknadMottattMedKommunenavn => "SOKNAD_MOTTATT_MED_KOMMUNENAVN",
            Self::SoknadMottattUtenKommunenavn => "SOKNAD_MOTTATT_UTEN_KOMMUNENAVN",
            Self::SoknadUnderBehandling => "SOKNAD_UNDER_BEHANDLING",
            Self::SoknadFerdigbehandlet => "SOKNAD_FERDIGBEHANDLET",
            Self::SoknadBehandlesIkke => "SOKNAD_BEHANDLES_IKKE",
            Self::SoknadVideresendtPapirsoknadMedNorgEnhet => {
                "SOKNAD_VIDERESENDT_PAPIRSOKNAD_MED_NORG_ENHET"
            }
            Self::SoknadVideresendtPapirsoknadUtenNorgEnhet => {
                "SOKNAD_VIDERESENDT_PAPIRSOKNAD_UTEN_NORG_ENHET"
            }
            Self::SoknadVideresendtMedNorgEnhet => "SOKNAD_VIDERESENDT_MED_NORG_ENHET",
            Self::SoknadVideresendtUtenNorgEnhet => "SOKNAD_VIDERESENDT_UTEN_NORG_ENHET",
            Self::SoknadKanIkkeViseStatusMedTittel => "SOKNAD_KAN_IKKE_VISE_STATUS_MED_TITTEL",
            Self::SoknadKanIkkeViseStatusUtenTittel => "SOKNAD_KAN_IKKE_VISE_STATUS_UTEN_TITTEL",
            Self::SakUnderBehandlingMedTittel => "SAK_UNDER_BEHANDLING_MED_TITTEL",
            Self::SakUnderBehandlingUtenTittel => "SAK_UNDER_BEHANDLING_UTEN_TITTEL",
            Self::SakFerdigbehandletMedTittel => "SAK_FERDIGBEHANDLET_MED_TITTEL",
            Self::SakFerdigbehandletUtenTittel => "SAK_FERDIGBEHANDLET_UTEN_TITTEL",
            Self::SakKanIkkeViseStatusMedTittel => "SAK_KAN_IKKE_VISE_STATUS_MED_TITTEL",
            Self::SakKanIkkeViseStatusUtenTittel => "SAK_KAN_IKKE_VISE_STATUS_UTEN_TITTEL",
            Self::AntallSendteVedlegg => "ANTALL_SENDTE_VEDLEGG",
            Self::UtbetalingerOppdatert => "UTBETALINGER_OPPDATERT",
            Self::BrevOmSaksbehandlingstid => "BREV_OM_SAKSBEANDLINGSTID",
            Self::EttersporMerDokumentasjon => "ETTERSPOR_MER_DOKUMENTASJON",
            Self::EttersporIkkeMerDokumentasjon => "ETTERSPOR_IKKE_MER_DOKUMENTASJON",
            Self::Dokumentasjonkrav => "DOKUMENTASJONKRAV",
            Self::VilkarOppdatert => "VILKAR_OPPDATERT",
            Self::VisBrevetLenketekst => "VIS_BREVET_LENKETEKST",
            Self::SoknadSendTilKontorLenketekst => "SOKNAD_SEND_TIL_KONTOR_LENKETEKST",
        }
    }
}
