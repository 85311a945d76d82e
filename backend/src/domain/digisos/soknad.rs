//! Original søknad document and vedlegg specifications stored in Fiks.

use serde::{Deserialize, Serialize};

use crate::domain::model::Hendelsetype;

/// Status of a vedlegg that has been uploaded.
pub const LASTET_OPP_STATUS: &str = "LastetOpp";

/// Status of a vedlegg the søker promised to send later.
pub const VEDLEGG_KREVES_STATUS: &str = "VedleggKreves";

/// The parts of `soknad.json` innsyn reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSoknad {
    #[serde(default)]
    pub mottaker: Option<JsonSoknadsmottaker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSoknadsmottaker {
    #[serde(default)]
    pub enhetsnummer: Option<String>,
    #[serde(default)]
    pub nav_enhetsnavn: Option<String>,
    #[serde(default)]
    pub kommunenummer: Option<String>,
}

/// `vedlegg.json`: describes the files of one innsending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonVedleggSpesifikasjon {
    #[serde(default)]
    pub vedlegg: Vec<JsonVedlegg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonVedlegg {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilleggsinfo: Option<String>,
    pub status: String,
    #[serde(default)]
    pub filer: Vec<JsonFiler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hendelse_type: Option<Hendelsetype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hendelse_referanse: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonFiler {
    pub filnavn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,
}
