//! Driven port for the Fiks digisos API.
//!
//! The adapter owns token exchange, headers and caching. Documents are
//! returned as raw JSON bytes so the domain decides which model to decode.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Token;
use crate::domain::digisos::{DigisosSak, JsonVedleggSpesifikasjon};

/// Whether a lookup may be answered from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    UseCache,
    Bypass,
}

/// One encrypted file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KryptertFil {
    pub filnavn: String,
    pub mimetype: String,
    /// Size of the file before encryption.
    pub storrelse: i64,
    pub data: Vec<u8>,
}

/// Ettersendelse posted to Fiks as one multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ettersending {
    pub fiks_digisos_id: String,
    pub kommunenummer: String,
    pub nav_ekstern_ref_id: String,
    pub vedlegg_spesifikasjon: JsonVedleggSpesifikasjon,
    pub filer: Vec<KryptertFil>,
}

define_port_error! {
    /// Errors surfaced while calling Fiks.
    pub enum FiksClientError {
        /// The digisos sak or document does not exist.
        NotFound { message: String } => "fiks fant ikke ressursen: {message}",
        /// Fiks rejected the token.
        Unauthorized { message: String } => "fiks avviste token: {message}",
        /// Fiks answered with a 4xx status.
        Client { status: u16, message: String } => "fiks klientfeil {status}: {message}",
        /// Fiks answered with a 5xx status.
        Server { status: u16, message: String } => "fiks serverfeil {status}: {message}",
        /// The request never produced a response.
        Transport { message: String } => "fiks transportfeil: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "fiks svar kunne ikke leses: {message}",
    }
}

/// Port for reading and writing digisos saker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FiksClient: Send + Sync {
    /// Fetch one digisos sak.
    async fn hent_digisos_sak(
        &self,
        fiks_digisos_id: &str,
        token: &Token,
        cache: CachePolicy,
    ) -> Result<DigisosSak, FiksClientError>;

    /// Fetch every digisos sak belonging to the token's subject.
    async fn hent_alle_digisos_saker(&self, token: &Token)
    -> Result<Vec<DigisosSak>, FiksClientError>;

    /// Fetch a JSON document from the dokumentlager.
    ///
    /// `versjon` distinguishes revisions of a document that keeps its id,
    /// such as the innsyn document.
    async fn hent_dokument(
        &self,
        fiks_digisos_id: &str,
        dokumentlager_id: &str,
        versjon: Option<i64>,
        token: &Token,
    ) -> Result<Vec<u8>, FiksClientError>;

    /// Upload an ettersendelse. Resending an existing ettersendelse succeeds.
    async fn last_opp_nye_ettersendte_vedlegg(
        &self,
        ettersending: Ettersending,
        token: &Token,
    ) -> Result<(), FiksClientError>;
}
