//! Test helpers for inbound HTTP components.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::web;
use serde_json::Value;

use crate::domain::digisos::DigisosSak;
use crate::domain::ports::{
    Adressebeskyttelse, Gradering, MockDocumentEncryptor, MockDokumentlagerClient,
    MockPdfGenerator, MockPdfInspector, MockPdlClient, MockTokenIntrospector, MockVirusScanner,
    PdlNavn, PdlPerson, TokenIntrospection,
};
use crate::domain::test_fixtures::{FNR, clock_at, fiks_client, kommune_service, norg, urls};
use crate::domain::{
    EttersendelsePdfGenerator, EventService, FiksService, ForelopigSvarService, HendelseService,
    OppgaveService, SaksStatusService, SaksoversiktService, SoknadsStatusService, TilgangService,
    UtbetalingerService, VedleggOpplastingService, VedleggService,
};
use crate::inbound::http::state::{HttpState, HttpStateServices};

/// Bearer value accepted by [`introspector`].
pub const VALID_TOKEN: &str = "gyldig-token";
pub const LOGIN_URL: &str = "https://login.nav.test/oauth2/login";

/// Texas mock accepting [`VALID_TOKEN`] as a Level4 token for [`FNR`].
pub fn introspector() -> MockTokenIntrospector {
    let mut mock = MockTokenIntrospector::new();
    mock.expect_introspect().returning(|token| {
        if token.as_str() == VALID_TOKEN {
            Ok(TokenIntrospection {
                active: true,
                error: None,
                acr: Some("Level4".to_owned()),
                pid: Some(FNR.to_owned()),
            })
        } else {
            Ok(TokenIntrospection::default())
        }
    });
    mock
}

/// PDL mock answering with the given gradering and the fixture ident.
pub fn pdl(gradering: Gradering) -> MockPdlClient {
    let mut pdl = MockPdlClient::new();
    pdl.expect_hent_person().returning(move |_, _| {
        Ok(Some(PdlPerson {
            adressebeskyttelse: vec![Adressebeskyttelse { gradering }],
            navn: vec![PdlNavn {
                fornavn: Some("KARI".to_owned()),
                mellomnavn: None,
                etternavn: Some("NORDMANN".to_owned()),
            }],
        }))
    });
    pdl.expect_hent_identer()
        .returning(|_, _| Ok(vec![FNR.to_owned()]));
    pdl
}

/// Virus scanner accepting every file.
fn virus_scanner() -> MockVirusScanner {
    let mut scanner = MockVirusScanner::new();
    scanner.expect_scan().returning(|_, _| Ok(()));
    scanner
}

/// Full handler state backed by mocks serving `saker` and `dokumenter`.
pub fn test_state(
    saker: Vec<DigisosSak>,
    dokumenter: HashMap<String, Value>,
    gradering: Gradering,
) -> web::Data<HttpState> {
    let clock = clock_at(2024, 3, 2);
    let tilgang = TilgangService::new(Arc::new(pdl(gradering)));
    let fiks = FiksService::new(Arc::new(fiks_client(saker, dokumenter)), tilgang.clone());
    let kommune = kommune_service(fiks.clone(), clock.clone());
    let event = EventService::new(
        fiks.clone(),
        kommune.clone(),
        Arc::new(norg()),
        urls(),
        clock.clone(),
    );
    let vedlegg = VedleggService::new(fiks.clone(), event.clone(), urls());
    let vedlegg_opplasting = VedleggOpplastingService::new(
        fiks.clone(),
        Arc::new(MockDokumentlagerClient::new()),
        Arc::new(virus_scanner()),
        Arc::new(MockDocumentEncryptor::new()),
        Arc::new(MockPdfInspector::new()),
        EttersendelsePdfGenerator::new(Arc::new(MockPdfGenerator::new()), clock.clone()),
    );
    let services = HttpStateServices {
        tilgang,
        saksoversikt: SaksoversiktService::new(
            fiks.clone(),
            event.clone(),
            vedlegg.clone(),
            kommune.clone(),
            clock.clone(),
        ),
        soknads_status: SoknadsStatusService::new(
            fiks.clone(),
            event.clone(),
            kommune.clone(),
            urls(),
            clock.clone(),
        ),
        saks_status: SaksStatusService::new(fiks.clone(), event.clone()),
        hendelse: HendelseService::new(fiks.clone(), event.clone(), vedlegg.clone()),
        oppgave: OppgaveService::new(fiks.clone(), event.clone(), vedlegg.clone(), Vec::new()),
        forelopig_svar: ForelopigSvarService::new(fiks.clone(), event.clone()),
        kommune,
        vedlegg,
        vedlegg_opplasting,
        utbetalinger: UtbetalingerService::new(fiks, event, clock),
    };
    web::Data::new(HttpState::new(
        Arc::new(introspector()),
        Some(LOGIN_URL.to_owned()),
        services,
    ))
}

pub fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {VALID_TOKEN}"))
}
