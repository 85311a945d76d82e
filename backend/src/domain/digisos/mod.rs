//! Serde models for the JSON documents exchanged with Fiks.

mod hendelse;
mod kommune_info;
mod sak;
mod soknad;

pub use hendelse::{
    JsonAvsender, JsonDigisosSoker, JsonDokumentasjonEtterspurt, JsonDokumentasjonkrav,
    JsonDokumenter, JsonFilreferanse, JsonForelopigSvar, JsonForvaltningsbrev, JsonHendelse,
    JsonRammevedtak, JsonSaksStatus, JsonSoknadsStatus, JsonTildeltNavKontor, JsonUtbetaling,
    JsonVedtakFattet, JsonVilkar,
};
pub use kommune_info::KommuneInfo;
pub use sak::{
    DigisosSak, DigisosSoker, DokumentInfo, Ettersendelse, EttersendtInfoNav, OriginalSoknadNav,
};
pub use soknad::{
    JsonFiler, JsonSoknad, JsonSoknadsmottaker, JsonVedlegg, JsonVedleggSpesifikasjon,
    LASTET_OPP_STATUS, VEDLEGG_KREVES_STATUS,
};
