//! Reqwest-backed adapter for the Fiks digisos API.
//!
//! One client serves the user endpoints (sak, documents, upload) with the
//! citizen's own token, and the machine endpoints (dokumentlager
//! certificate, kommuneinfo) with a Maskinporten token from Texas.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::Token;
use crate::domain::digisos::{DigisosSak, KommuneInfo};
use crate::domain::ports::{
    CachePolicy, DokumentlagerClient, Ettersending, FiksClient, FiksClientError,
    KommuneInfoClient, KommuneInfoClientError, TokenExchanger,
};
use crate::outbound::http_support::{
    RetryPolicy, bearer, body_preview, build_client, status_message, with_call_id,
};

const HEADER_INTEGRASJON_ID: &str = "IntegrasjonId";
const HEADER_INTEGRASJON_PASSORD: &str = "IntegrasjonPassord";
const API_PREFIX: [&str; 3] = ["digisos", "api", "v1"];

/// Connection settings for Fiks.
#[derive(Debug, Clone)]
pub struct FiksHttpSettings {
    pub base_url: Url,
    pub integrasjon_id: String,
    pub integrasjon_passord: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

pub struct FiksHttpClient {
    client: Client,
    base_url: Url,
    integrasjon_id: String,
    integrasjon_passord: String,
    retry: RetryPolicy,
    tokens: Arc<dyn TokenExchanger>,
    public_key: OnceLock<Vec<u8>>,
}

impl FiksHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        settings: FiksHttpSettings,
        tokens: Arc<dyn TokenExchanger>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            base_url: settings.base_url,
            integrasjon_id: settings.integrasjon_id,
            integrasjon_passord: settings.integrasjon_passord,
            retry: settings.retry,
            tokens,
            public_key: OnceLock::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FiksClientError> {
        endpoint(&self.base_url, segments)
    }

    fn request(&self, builder: RequestBuilder, authorization: &Token) -> RequestBuilder {
        with_call_id(builder)
            .header(HEADER_INTEGRASJON_ID, self.integrasjon_id.as_str())
            .header(HEADER_INTEGRASJON_PASSORD, self.integrasjon_passord.as_str())
            .header(header::AUTHORIZATION, bearer(authorization))
    }

    async fn get_bytes(&self, url: &Url, token: &Token) -> Result<Vec<u8>, FiksClientError> {
        let response = self
            .request(self.client.get(url.clone()), token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| FiksClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FiksClientError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    async fn get_with_retry(
        &self,
        operation: &str,
        url: &Url,
        token: &Token,
    ) -> Result<Vec<u8>, FiksClientError> {
        self.retry
            .run(operation, is_retryable, || self.get_bytes(url, token))
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &Url,
        token: &Token,
    ) -> Result<T, FiksClientError> {
        let body = self.get_with_retry(operation, url, token).await?;
        serde_json::from_slice(&body)
            .map_err(|err| FiksClientError::decode(format!("{operation}: {err}")))
    }

    async fn maskinporten_token(&self) -> Result<Token, FiksClientError> {
        self.tokens
            .maskinporten()
            .await
            .map_err(|err| FiksClientError::unauthorized(format!("maskinporten: {err}")))
    }
}

#[async_trait]
impl FiksClient for FiksHttpClient {
    async fn hent_digisos_sak(
        &self,
        fiks_digisos_id: &str,
        token: &Token,
        _cache: CachePolicy,
    ) -> Result<DigisosSak, FiksClientError> {
        debug!(fiks_digisos_id, "henter digisosSak fra Fiks");
        let url = self.endpoint(&["soknader", fiks_digisos_id])?;
        let sak = self.get_json("hentDigisosSak", &url, token).await?;
        debug!(fiks_digisos_id, "hentet digisosSak fra Fiks");
        Ok(sak)
    }

    async fn hent_alle_digisos_saker(
        &self,
        token: &Token,
    ) -> Result<Vec<DigisosSak>, FiksClientError> {
        let url = self.endpoint(&["soknader", "soknader"])?;
        self.get_json("hentAlleDigisosSaker", &url, token).await
    }

    async fn hent_dokument(
        &self,
        fiks_digisos_id: &str,
        dokumentlager_id: &str,
        _versjon: Option<i64>,
        token: &Token,
    ) -> Result<Vec<u8>, FiksClientError> {
        debug!(fiks_digisos_id, dokumentlager_id, "henter dokument fra Fiks");
        let url = self.endpoint(&["soknader", fiks_digisos_id, "dokumenter", dokumentlager_id])?;
        self.get_with_retry("hentDokument", &url, token).await
    }

    async fn last_opp_nye_ettersendte_vedlegg(
        &self,
        ettersending: Ettersending,
        token: &Token,
    ) -> Result<(), FiksClientError> {
        let Ettersending {
            fiks_digisos_id,
            kommunenummer,
            nav_ekstern_ref_id,
            vedlegg_spesifikasjon,
            filer,
        } = ettersending;
        info!(
            fiks_digisos_id = fiks_digisos_id.as_str(),
            antall_filer = filer.len(),
            "starter sending av ettersendelse til Fiks"
        );

        let url = self.endpoint(&[
            "soknader",
            kommunenummer.as_str(),
            fiks_digisos_id.as_str(),
            nav_ekstern_ref_id.as_str(),
        ])?;
        let mut form = Form::new().part("vedlegg.json", json_part(&vedlegg_spesifikasjon)?);
        for (index, fil) in filer.into_iter().enumerate() {
            let metadata = VedleggMetadata {
                filnavn: &fil.filnavn,
                mimetype: &fil.mimetype,
                storrelse: fil.storrelse,
            };
            form = form.part(format!("vedleggSpesifikasjon:{index}"), json_part(&metadata)?);
            let dokument = Part::bytes(fil.data)
                .file_name(fil.filnavn)
                .mime_str("application/octet-stream")
                .map_err(|err| FiksClientError::decode(err.to_string()))?;
            form = form.part(format!("dokument:{index}"), dokument);
        }

        let response = self
            .request(self.client.post(url), token)
            .multipart(form)
            .send()
            .await
            .map_err(|err| FiksClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FiksClientError::transport(err.to_string()))?;

        if status == StatusCode::BAD_REQUEST && er_allerede_lastet_opp(body.as_ref(), &fiks_digisos_id)
        {
            warn!(
                fiks_digisos_id = fiks_digisos_id.as_str(),
                "ettersendelsen finnes allerede hos Fiks, regnes som sendt"
            );
            return Ok(());
        }
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        info!(
            fiks_digisos_id = fiks_digisos_id.as_str(),
            kommunenummer = kommunenummer.as_str(),
            nav_ekstern_ref_id = nav_ekstern_ref_id.as_str(),
            status = status.as_u16(),
            "sendte ettersendelse til Fiks"
        );
        Ok(())
    }
}

#[async_trait]
impl DokumentlagerClient for FiksHttpClient {
    async fn hent_dokumentlager_public_key(&self) -> Result<Vec<u8>, FiksClientError> {
        if let Some(key) = self.public_key.get() {
            return Ok(key.clone());
        }
        let token = self.maskinporten_token().await?;
        let url = self.endpoint(&["dokumentlager-public-key"])?;
        let key = self
            .get_with_retry("hentDokumentlagerPublicKey", &url, &token)
            .await?;
        info!("hentet public key for dokumentlager");
        if self.public_key.set(key.clone()).is_err() {
            debug!("public key for dokumentlager var allerede hentet");
        }
        Ok(key)
    }
}

#[async_trait]
impl KommuneInfoClient for FiksHttpClient {
    async fn hent_kommune_info(
        &self,
        kommunenummer: &str,
    ) -> Result<KommuneInfo, KommuneInfoClientError> {
        let token = self
            .maskinporten_token()
            .await
            .map_err(|err| KommuneInfoClientError::upstream(err.to_string()))?;
        let url = self
            .endpoint(&["nav", "kommuner", kommunenummer])
            .map_err(|err| KommuneInfoClientError::upstream(err.to_string()))?;
        self.get_json("hentKommuneInfo", &url, &token)
            .await
            .map_err(|err| {
                warn!(kommunenummer, error = %err, "Fiks - hentKommuneInfo feilet");
                match err {
                    FiksClientError::NotFound { .. } => KommuneInfoClientError::not_found(kommunenummer),
                    other => KommuneInfoClientError::upstream(other.to_string()),
                }
            })
    }
}

#[derive(Debug, Serialize)]
struct VedleggMetadata<'a> {
    filnavn: &'a str,
    mimetype: &'a str,
    storrelse: i64,
}

#[derive(Debug, Deserialize)]
struct FiksErrorMessage {
    message: Option<String>,
}

fn json_part<T: Serialize>(value: &T) -> Result<Part, FiksClientError> {
    let json = serde_json::to_string(value)
        .map_err(|err| FiksClientError::decode(format!("feil under serialisering av metadata: {err}")))?;
    Part::text(json)
        .mime_str("application/json")
        .map_err(|err| FiksClientError::decode(err.to_string()))
}

/// `{base}/digisos/api/v1/<segments>`, each segment percent-encoded.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, FiksClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| FiksClientError::transport(format!("ugyldig Fiks-url: {base}")))?
        .pop_if_empty()
        .extend(API_PREFIX)
        .extend(segments);
    Ok(url)
}

fn is_retryable(error: &FiksClientError) -> bool {
    matches!(
        error,
        FiksClientError::Server { .. } | FiksClientError::Transport { .. }
    )
}

fn map_status_error(status: StatusCode, body: &[u8]) -> FiksClientError {
    let message = status_message(status, body);
    match status {
        StatusCode::NOT_FOUND => FiksClientError::not_found(message),
        StatusCode::UNAUTHORIZED => FiksClientError::unauthorized(message),
        _ if status.is_client_error() => FiksClientError::client(status.as_u16(), message),
        _ => FiksClientError::server(status.as_u16(), message),
    }
}

/// Fiks answers 400 when the same navEksternRefId is posted twice.
fn er_allerede_lastet_opp(body: &[u8], fiks_digisos_id: &str) -> bool {
    let melding = serde_json::from_slice::<FiksErrorMessage>(body)
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| body_preview(body));
    melding.starts_with("Ettersendelse med tilhørende navEksternRefId ")
        && melding.ends_with(&format!(" finnes allerde for oppgitt DigisosId {fiks_digisos_id}"))
}
