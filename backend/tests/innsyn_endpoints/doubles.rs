//! Test doubles for the driven ports used by the innsyn endpoint suite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use innsyn_api::domain::Token;
use innsyn_api::domain::digisos::{DigisosSak, KommuneInfo};
use innsyn_api::domain::ports::{
    Adressebeskyttelse, CachePolicy, DocumentEncryptor, DokumentlagerClient, EncryptionError,
    Ettersending, FiksClient, FiksClientError, Gradering, KommuneInfoClient,
    KommuneInfoClientError, NavEnhet, NorgClient, NorgClientError, PdfDocument, PdfGenerator,
    PdfGeneratorError, PdfInspection, PdfInspector, PdlClient, PdlClientError, PdlNavn, PdlPerson,
    TokenError, TokenIntrospection, TokenIntrospector, VirusScanError, VirusScanner,
};
use mockable::Clock;
use serde_json::Value;

pub(crate) const FNR: &str = "12345678910";
pub(crate) const VALID_TOKEN: &str = "gyldig-token";

/// Fiks serving fixed saker and documents and recording every upload.
#[derive(Clone)]
pub(crate) struct RecordingFiksClient {
    saker: Vec<DigisosSak>,
    dokumenter: HashMap<String, Value>,
    uploads: Arc<Mutex<Vec<Ettersending>>>,
}

impl RecordingFiksClient {
    pub(crate) fn new(saker: Vec<DigisosSak>, dokumenter: HashMap<String, Value>) -> Self {
        Self {
            saker,
            dokumenter,
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn uploads(&self) -> Vec<Ettersending> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

#[async_trait]
impl FiksClient for RecordingFiksClient {
    async fn hent_digisos_sak(
        &self,
        fiks_digisos_id: &str,
        _token: &Token,
        _cache: CachePolicy,
    ) -> Result<DigisosSak, FiksClientError> {
        self.saker
            .iter()
            .find(|sak| sak.fiks_digisos_id == fiks_digisos_id)
            .cloned()
            .ok_or_else(|| FiksClientError::not_found(fiks_digisos_id))
    }

    async fn hent_alle_digisos_saker(&self, _token: &Token) -> Result<Vec<DigisosSak>, FiksClientError> {
        Ok(self.saker.clone())
    }

    async fn hent_dokument(
        &self,
        _fiks_digisos_id: &str,
        dokumentlager_id: &str,
        _versjon: Option<i64>,
        _token: &Token,
    ) -> Result<Vec<u8>, FiksClientError> {
        let dokument = self
            .dokumenter
            .get(dokumentlager_id)
            .ok_or_else(|| FiksClientError::not_found(dokumentlager_id))?;
        serde_json::to_vec(dokument).map_err(|err| FiksClientError::decode(err.to_string()))
    }

    async fn last_opp_nye_ettersendte_vedlegg(
        &self,
        ettersending: Ettersending,
        _token: &Token,
    ) -> Result<(), FiksClientError> {
        self.uploads.lock().expect("uploads lock").push(ettersending);
        Ok(())
    }
}

pub(crate) struct StubDokumentlager;

#[async_trait]
impl DokumentlagerClient for StubDokumentlager {
    async fn hent_dokumentlager_public_key(&self) -> Result<Vec<u8>, FiksClientError> {
        Ok(b"sertifikat".to_vec())
    }
}

/// Every kommune accepts søknader and status updates.
pub(crate) struct StubKommuneInfo;

#[async_trait]
impl KommuneInfoClient for StubKommuneInfo {
    async fn hent_kommune_info(
        &self,
        kommunenummer: &str,
    ) -> Result<KommuneInfo, KommuneInfoClientError> {
        Ok(KommuneInfo {
            kommunenummer: kommunenummer.to_owned(),
            kan_motta_soknader: true,
            kan_oppdatere_status: true,
            har_midlertidig_deaktivert_mottak: false,
            har_midlertidig_deaktivert_oppdateringer: false,
            behandlingsansvarlig: None,
        })
    }
}

/// PDL knowing [`FNR`] as Kari with the given gradering.
pub(crate) struct StubPdl {
    pub(crate) gradering: Gradering,
}

#[async_trait]
impl PdlClient for StubPdl {
    async fn hent_person(&self, _ident: &str, _token: &Token) -> Result<Option<PdlPerson>, PdlClientError> {
        Ok(Some(PdlPerson {
            adressebeskyttelse: vec![Adressebeskyttelse {
                gradering: self.gradering,
            }],
            navn: vec![PdlNavn {
                fornavn: Some("KARI".to_owned()),
                mellomnavn: None,
                etternavn: Some("NORDMANN".to_owned()),
            }],
        }))
    }

    async fn hent_identer(&self, _ident: &str, _token: &Token) -> Result<Vec<String>, PdlClientError> {
        Ok(vec![FNR.to_owned()])
    }
}

pub(crate) struct StubNorg;

#[async_trait]
impl NorgClient for StubNorg {
    async fn hent_nav_enhet(&self, enhetsnr: &str) -> Result<NavEnhet, NorgClientError> {
        Ok(NavEnhet {
            enhet_nr: enhetsnr.to_owned(),
            navn: format!("NAV {enhetsnr}"),
            status: None,
            sosiale_tjenester: None,
        })
    }
}

pub(crate) struct CleanVirusScanner;

#[async_trait]
impl VirusScanner for CleanVirusScanner {
    async fn scan(&self, _filnavn: &str, _data: &[u8]) -> Result<(), VirusScanError> {
        Ok(())
    }
}

/// Prefixes the data so uploads can be told apart from plaintext.
pub(crate) struct PrefixEncryptor;

impl DocumentEncryptor for PrefixEncryptor {
    fn encrypt(&self, data: &[u8], _certificate: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let mut kryptert = b"kryptert:".to_vec();
        kryptert.extend_from_slice(data);
        Ok(kryptert)
    }
}

pub(crate) struct StubPdfGenerator;

impl PdfGenerator for StubPdfGenerator {
    fn generate(&self, document: &PdfDocument) -> Result<Vec<u8>, PdfGeneratorError> {
        Ok(format!("%PDF {}", document.title).into_bytes())
    }
}

pub(crate) struct ReadablePdfInspector;

impl PdfInspector for ReadablePdfInspector {
    fn inspect(&self, _data: &[u8]) -> PdfInspection {
        PdfInspection::Ok
    }
}

/// Texas accepting [`VALID_TOKEN`] as a Level4 token for [`FNR`].
pub(crate) struct StubIntrospector;

#[async_trait]
impl TokenIntrospector for StubIntrospector {
    async fn introspect(&self, token: &Token) -> Result<TokenIntrospection, TokenError> {
        if token.as_str() != VALID_TOKEN {
            return Ok(TokenIntrospection::default());
        }
        Ok(TokenIntrospection {
            active: true,
            error: None,
            acr: Some("Level4".to_owned()),
            pid: Some(FNR.to_owned()),
        })
    }
}

pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

impl FixedClock {
    pub(crate) fn at(y: i32, m: u32, d: u32) -> Self {
        Self(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0)
                .single()
                .expect("valid fixture timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
