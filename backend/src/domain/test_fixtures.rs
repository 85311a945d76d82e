//! Shared builders for domain service tests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use super::digisos::{DigisosSak, KommuneInfo};
use super::ports::{
    FiksClientError, MockFiksClient, MockKommuneInfoClient, MockNorgClient, MockPdlClient,
    NavEnhet, NorgClientError,
};
use super::support::DokumentUrls;
use super::{AuthenticatedUser, EventService, FiksService, KommuneService, TilgangService, Token};

pub(crate) const FNR: &str = "12345678910";
pub(crate) const DIGISOS_ID: &str = "123";
pub(crate) const SOKNAD_METADATA: &str = "soknad-metadata";
pub(crate) const VEDLEGG_METADATA: &str = "vedlegg-metadata";
pub(crate) const INNSYN_METADATA: &str = "innsyn-metadata";

pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Clock frozen at the given UTC instant.
pub(crate) fn clock_at(y: i32, m: u32, d: u32) -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: Utc
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp"),
    })
}

pub(crate) fn user() -> AuthenticatedUser {
    AuthenticatedUser::new(FNR, Token::new("token"))
}

pub(crate) fn urls() -> DokumentUrls {
    DokumentUrls {
        dokumentlager: "https://dokumentlager".to_owned(),
        svarut: "https://svarut".to_owned(),
    }
}

/// Sak with an original søknad sent at `timestamp_sendt` and an innsyn document.
pub(crate) fn sak_json(timestamp_sendt: i64) -> Value {
    json!({
        "fiksDigisosId": DIGISOS_ID,
        "sokerFnr": FNR,
        "fiksOrgId": "org",
        "kommunenummer": "0301",
        "sistEndret": timestamp_sendt,
        "originalSoknadNAV": {
            "navEksternRefId": "11000001",
            "metadata": SOKNAD_METADATA,
            "vedleggMetadata": VEDLEGG_METADATA,
            "soknadDokument": {
                "filnavn": "soknad.pdf",
                "dokumentlagerDokumentId": "soknad-pdf",
                "storrelse": 1
            },
            "timestampSendt": timestamp_sendt
        },
        "digisosSoker": {
            "metadata": INNSYN_METADATA,
            "timestampSistOppdatert": timestamp_sendt
        }
    })
}

pub(crate) fn sak(value: Value) -> DigisosSak {
    serde_json::from_value(value).expect("valid digisos sak")
}

pub(crate) fn kommune_info(kan_oppdatere_status: bool) -> KommuneInfo {
    KommuneInfo {
        kommunenummer: "0301".to_owned(),
        kan_motta_soknader: true,
        kan_oppdatere_status,
        har_midlertidig_deaktivert_mottak: false,
        har_midlertidig_deaktivert_oppdateringer: false,
        behandlingsansvarlig: None,
    }
}

/// PDL mock that recognises [`FNR`] as the user's only ident.
pub(crate) fn tilgang() -> TilgangService {
    let mut pdl = MockPdlClient::new();
    pdl.expect_hent_identer()
        .returning(|_, _| Ok(vec![FNR.to_owned()]));
    pdl.expect_hent_person().returning(|_, _| Ok(None));
    TilgangService::new(Arc::new(pdl))
}

/// Fiks mock serving the given saker and dokumentlager documents.
pub(crate) fn fiks_client(saker: Vec<DigisosSak>, dokumenter: HashMap<String, Value>) -> MockFiksClient {
    let mut fiks = MockFiksClient::new();
    let alle = saker.clone();
    fiks.expect_hent_digisos_sak().returning(move |id, _, _| {
        saker
            .iter()
            .find(|sak| sak.fiks_digisos_id == id)
            .cloned()
            .ok_or_else(|| FiksClientError::not_found(id))
    });
    fiks.expect_hent_alle_digisos_saker()
        .returning(move |_| Ok(alle.clone()));
    fiks.expect_hent_dokument().returning(move |_, id, _, _| {
        dokumenter
            .get(id)
            .map(|value| serde_json::to_vec(value).expect("serialisable fixture"))
            .ok_or_else(|| FiksClientError::not_found(id))
    });
    fiks
}

pub(crate) fn fiks_service(fiks: MockFiksClient) -> FiksService {
    FiksService::new(Arc::new(fiks), tilgang())
}

pub(crate) fn kommune_service(fiks: FiksService, clock: Arc<dyn Clock>) -> KommuneService {
    let mut kommune = MockKommuneInfoClient::new();
    kommune
        .expect_hent_kommune_info()
        .returning(|_| Ok(kommune_info(true)));
    KommuneService::new(fiks, Arc::new(kommune), clock)
}

/// NORG mock naming every office `NAV <enhetsnr>`.
pub(crate) fn norg() -> MockNorgClient {
    let mut norg = MockNorgClient::new();
    norg.expect_hent_nav_enhet().returning(|enhetsnr| {
        if enhetsnr == "9999" {
            return Err(NorgClientError::status(404_u16, "ukjent enhet"));
        }
        Ok(NavEnhet {
            enhet_nr: enhetsnr.to_owned(),
            navn: format!("NAV {enhetsnr}"),
            status: None,
            sosiale_tjenester: None,
        })
    });
    norg
}

/// Event service wired to mocks serving one sak and its documents.
pub(crate) fn event_service(
    saker: Vec<DigisosSak>,
    dokumenter: HashMap<String, Value>,
    clock: Arc<dyn Clock>,
) -> EventService {
    let fiks = fiks_service(fiks_client(saker, dokumenter));
    let kommune = kommune_service(fiks.clone(), clock.clone());
    EventService::new(fiks, kommune, Arc::new(norg()), urls(), clock)
}

/// Document set for a sak: søknad, empty vedleggspesifikasjon and an innsyn document.
pub(crate) fn dokumenter(hendelser: Value) -> HashMap<String, Value> {
    HashMap::from([
        (
            SOKNAD_METADATA.to_owned(),
            json!({ "mottaker": { "enhetsnummer": "0301", "navEnhetsnavn": "NAV Grünerløkka, Oslo kommune" } }),
        ),
        (VEDLEGG_METADATA.to_owned(), json!({ "vedlegg": [] })),
        (
            INNSYN_METADATA.to_owned(),
            json!({
                "version": "1.0.0",
                "avsender": { "systemnavn": "Testsystemet", "systemversjon": "1.0.0" },
                "hendelser": hendelser
            }),
        ),
    ])
}
