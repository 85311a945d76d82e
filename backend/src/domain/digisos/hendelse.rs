//! Innsyn document (`digisos-soker.json`) written by the kommune fagsystem.
//!
//! Each hendelse is tagged by its `type` field. Timestamps stay as the raw
//! ISO-8601 strings Fiks delivers; the event fold converts them to Norwegian
//! local time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::model::{Oppgavestatus, SaksStatus, SoknadsStatus, UtbetalingsStatus, UtfallVedtak};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDigisosSoker {
    /// Schema version, `version` on the wire.
    #[serde(default, rename = "version")]
    pub versjon: Option<String>,
    #[serde(default)]
    pub avsender: Option<JsonAvsender>,
    #[serde(default)]
    pub hendelser: Vec<JsonHendelse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAvsender {
    #[serde(default)]
    pub systemnavn: Option<String>,
    #[serde(default)]
    pub systemversjon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsonHendelse {
    SoknadsStatus(JsonSoknadsStatus),
    TildeltNavKontor(JsonTildeltNavKontor),
    SaksStatus(JsonSaksStatus),
    VedtakFattet(JsonVedtakFattet),
    DokumentasjonEtterspurt(JsonDokumentasjonEtterspurt),
    ForelopigSvar(JsonForelopigSvar),
    Utbetaling(JsonUtbetaling),
    Vilkar(JsonVilkar),
    Dokumentasjonkrav(JsonDokumentasjonkrav),
    Rammevedtak(JsonRammevedtak),
    #[serde(other)]
    Unknown,
}

impl JsonHendelse {
    /// Raw timestamp of the hendelse; empty for unknown types.
    pub fn hendelsestidspunkt(&self) -> &str {
        match self {
            Self::SoknadsStatus(h) => &h.hendelsestidspunkt,
            Self::TildeltNavKontor(h) => &h.hendelsestidspunkt,
            Self::SaksStatus(h) => &h.hendelsestidspunkt,
            Self::VedtakFattet(h) => &h.hendelsestidspunkt,
            Self::DokumentasjonEtterspurt(h) => &h.hendelsestidspunkt,
            Self::ForelopigSvar(h) => &h.hendelsestidspunkt,
            Self::Utbetaling(h) => &h.hendelsestidspunkt,
            Self::Vilkar(h) => &h.hendelsestidspunkt,
            Self::Dokumentasjonkrav(h) => &h.hendelsestidspunkt,
            Self::Rammevedtak(h) => &h.hendelsestidspunkt,
            Self::Unknown => "",
        }
    }

    /// Wire name of the hendelse type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SoknadsStatus(_) => "soknadsStatus",
            Self::TildeltNavKontor(_) => "tildeltNavKontor",
            Self::SaksStatus(_) => "saksStatus",
            Self::VedtakFattet(_) => "vedtakFattet",
            Self::DokumentasjonEtterspurt(_) => "dokumentasjonEtterspurt",
            Self::ForelopigSvar(_) => "forelopigSvar",
            Self::Utbetaling(_) => "utbetaling",
            Self::Vilkar(_) => "vilkar",
            Self::Dokumentasjonkrav(_) => "dokumentasjonkrav",
            Self::Rammevedtak(_) => "rammevedtak",
            Self::Unknown => "unknown",
        }
    }
}

/// Reference to a letter stored in the dokumentlager or in SvarUt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsonFilreferanse {
    Dokumentlager { id: String },
    #[serde(rename = "svarut")]
    SvarUt { id: String, nr: i32 },
}

impl JsonFilreferanse {
    pub fn id(&self) -> &str {
        match self {
            Self::Dokumentlager { id } | Self::SvarUt { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonForvaltningsbrev {
    pub referanse: JsonFilreferanse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSoknadsStatus {
    pub hendelsestidspunkt: String,
    pub status: SoknadsStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonTildeltNavKontor {
    pub hendelsestidspunkt: String,
    pub nav_kontor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSaksStatus {
    pub hendelsestidspunkt: String,
    pub referanse: String,
    #[serde(default)]
    pub tittel: Option<String>,
    #[serde(default)]
    pub status: Option<SaksStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonVedtakFattet {
    pub hendelsestidspunkt: String,
    #[serde(default)]
    pub saksreferanse: Option<String>,
    #[serde(default)]
    pub utfall: Option<UtfallVedtak>,
    pub vedtaksfil: JsonForvaltningsbrev,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDokumentasjonEtterspurt {
    pub hendelsestidspunkt: String,
    #[serde(default)]
    pub forvaltningsbrev: Option<JsonForvaltningsbrev>,
    #[serde(default)]
    pub dokumenter: Vec<JsonDokumenter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDokumenter {
    pub dokumenttype: String,
    #[serde(default)]
    pub tilleggsinformasjon: Option<String>,
    #[serde(default)]
    pub innsendelsesfrist: Option<String>,
    #[serde(default)]
    pub dokumentreferanse: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonForelopigSvar {
    pub hendelsestidspunkt: String,
    pub forvaltningsbrev: JsonForvaltningsbrev,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonUtbetaling {
    pub hendelsestidspunkt: String,
    pub utbetalingsreferanse: String,
    #[serde(default)]
    pub saksreferanse: Option<String>,
    #[serde(default)]
    pub status: Option<UtbetalingsStatus>,
    #[serde(default)]
    pub belop: Option<f64>,
    #[serde(default)]
    pub beskrivelse: Option<String>,
    #[serde(default)]
    pub forfallsdato: Option<NaiveDate>,
    #[serde(default)]
    pub stoppetdato: Option<NaiveDate>,
    #[serde(default)]
    pub utbetalingsdato: Option<NaiveDate>,
    #[serde(default)]
    pub fom: Option<NaiveDate>,
    #[serde(default)]
    pub tom: Option<NaiveDate>,
    #[serde(default)]
    pub annen_mottaker: Option<bool>,
    #[serde(default)]
    pub mottaker: Option<String>,
    #[serde(default)]
    pub kontonummer: Option<String>,
    #[serde(default)]
    pub utbetalingsmetode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonVilkar {
    pub hendelsestidspunkt: String,
    pub vilkarreferanse: String,
    #[serde(default)]
    pub utbetalingsreferanse: Vec<String>,
    #[serde(default)]
    pub tittel: Option<String>,
    #[serde(default)]
    pub beskrivelse: Option<String>,
    #[serde(default)]
    pub status: Option<Oppgavestatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDokumentasjonkrav {
    pub hendelsestidspunkt: String,
    pub dokumentasjonkravreferanse: String,
    #[serde(default)]
    pub utbetalingsreferanse: Vec<String>,
    #[serde(default)]
    pub tittel: Option<String>,
    #[serde(default)]
    pub beskrivelse: Option<String>,
    #[serde(default)]
    pub status: Option<Oppgavestatus>,
    #[serde(default)]
    pub frist: Option<String>,
    #[serde(default)]
    pub saksreferanse: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRammevedtak {
    pub hendelsestidspunkt: String,
}
