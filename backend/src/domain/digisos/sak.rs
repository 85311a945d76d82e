//! Digisos sak envelope returned by the Fiks digisos API.

use serde::{Deserialize, Serialize};

/// One søknad as stored in Fiks, including ettersendelser and innsyn metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigisosSak {
    pub fiks_digisos_id: String,
    pub soker_fnr: String,
    pub fiks_org_id: String,
    pub kommunenummer: String,
    /// Last change as epoch milliseconds.
    pub sist_endret: i64,
    #[serde(rename = "originalSoknadNAV", default)]
    pub original_soknad_nav: Option<OriginalSoknadNav>,
    #[serde(rename = "ettersendtInfoNAV", default)]
    pub ettersendt_info_nav: Option<EttersendtInfoNav>,
    #[serde(default)]
    pub digisos_soker: Option<DigisosSoker>,
}

impl DigisosSak {
    /// Ettersendelser in the order Fiks returned them.
    pub fn ettersendelser(&self) -> &[Ettersendelse] {
        self.ettersendt_info_nav
            .as_ref()
            .map_or(&[], |info| info.ettersendelser.as_slice())
    }

    /// True when the søknad was submitted on paper.
    pub fn is_papir_soknad(&self) -> bool {
        self.original_soknad_nav.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalSoknadNav {
    pub nav_ekstern_ref_id: String,
    pub metadata: String,
    pub vedlegg_metadata: String,
    pub soknad_dokument: DokumentInfo,
    #[serde(default)]
    pub vedlegg: Vec<DokumentInfo>,
    #[serde(default)]
    pub el_dokumenter: Vec<DokumentInfo>,
    /// Submission time as epoch milliseconds.
    pub timestamp_sendt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EttersendtInfoNav {
    #[serde(default)]
    pub ettersendelser: Vec<Ettersendelse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ettersendelse {
    pub nav_ekstern_ref_id: String,
    pub vedlegg_metadata: String,
    #[serde(default)]
    pub vedlegg: Vec<DokumentInfo>,
    /// Upload time as epoch milliseconds.
    pub timestamp_sendt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DokumentInfo {
    pub filnavn: String,
    pub dokumentlager_dokument_id: String,
    pub storrelse: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigisosSoker {
    pub metadata: String,
    #[serde(default)]
    pub dokumenter: Vec<DokumentInfo>,
    /// Last innsyn update as epoch milliseconds.
    pub timestamp_sist_oppdatert: i64,
}
