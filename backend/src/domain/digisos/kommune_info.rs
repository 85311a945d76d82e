use serde::{Deserialize, Serialize};

/// Kommune capabilities registered in Fiks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KommuneInfo {
    pub kommunenummer: String,
    #[serde(default)]
    pub kan_motta_soknader: bool,
    #[serde(default)]
    pub kan_oppdatere_status: bool,
    #[serde(default)]
    pub har_midlertidig_deaktivert_mottak: bool,
    #[serde(default)]
    pub har_midlertidig_deaktivert_oppdateringer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behandlingsansvarlig: Option<String>,
}
