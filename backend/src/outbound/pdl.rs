//! PDL GraphQL adapter with its caching decorator.
//!
//! Requests carry a TokenX token for the PDL audience and the
//! `Behandlingsnummer` and `Tema` headers PDL requires for audit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::cache::{cache_key, get_json, put_json};
use super::http_support::{bearer, build_client, status_message, with_call_id};
use crate::domain::Token;
use crate::domain::ports::{KeyValueCache, PdlClient, PdlClientError, PdlPerson, TokenExchanger};

const HEADER_BEHANDLINGSNUMMER: &str = "Behandlingsnummer";
const HEADER_TEMA: &str = "Tema";
const TEMA_KOM: &str = "KOM";

const HENT_PERSON_QUERY: &str = "query($ident: ID!) { hentPerson(ident: $ident) { \
    adressebeskyttelse { gradering } navn { fornavn mellomnavn etternavn } } }";
const HENT_IDENTER_QUERY: &str = "query($ident: ID!) { hentIdenter(ident: $ident, historikk: true) { \
    identer { ident } } }";

/// Connection settings for PDL.
#[derive(Debug, Clone)]
pub struct PdlHttpSettings {
    /// GraphQL endpoint.
    pub endpoint: Url,
    /// TokenX target, `<cluster>:pdl:pdl-api`.
    pub audience: String,
    pub behandlingsnummer: String,
    pub timeout: Duration,
}

pub struct PdlHttpClient {
    client: Client,
    endpoint: Url,
    audience: String,
    behandlingsnummer: String,
    tokens: Arc<dyn TokenExchanger>,
}

impl PdlHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: PdlHttpSettings, tokens: Arc<dyn TokenExchanger>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            endpoint: settings.endpoint,
            audience: settings.audience,
            behandlingsnummer: settings.behandlingsnummer,
            tokens,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        ident: &str,
        token: &Token,
    ) -> Result<GraphQlResponse<T>, PdlClientError> {
        let pdl_token = self
            .tokens
            .tokenx(&self.audience, token)
            .await
            .map_err(|err| PdlClientError::token(err.to_string()))?;
        let response = with_call_id(self.client.post(self.endpoint.clone()))
            .header(header::AUTHORIZATION, bearer(&pdl_token))
            .header(HEADER_BEHANDLINGSNUMMER, self.behandlingsnummer.as_str())
            .header(HEADER_TEMA, TEMA_KOM)
            .json(&GraphQlRequest {
                query,
                variables: Variables { ident },
            })
            .send()
            .await
            .map_err(|err| PdlClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PdlClientError::transport(err.to_string()))?;
        if status != StatusCode::OK {
            return Err(PdlClientError::status(status.as_u16(), status_message(status, body.as_ref())));
        }
        serde_json::from_slice(&body)
            .map_err(|err| PdlClientError::graph_ql(format!("ugyldig svar fra pdl: {err}")))
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    ident: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HentPersonData {
    hent_person: Option<PdlPerson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HentIdenterData {
    hent_identer: Option<Identliste>,
}

#[derive(Debug, Deserialize)]
struct Identliste {
    #[serde(default)]
    identer: Vec<IdentInformasjon>,
}

#[derive(Debug, Deserialize)]
struct IdentInformasjon {
    ident: String,
}

/// Split GraphQL errors into "person missing" and real failures.
fn check_errors<T>(response: GraphQlResponse<T>) -> Result<Option<T>, PdlClientError> {
    if response.errors.is_empty() {
        return Ok(response.data);
    }
    if response
        .errors
        .iter()
        .all(|error| error.code() == Some("not_found"))
    {
        debug!("pdl fant ikke person");
        return Ok(None);
    }
    let message = response
        .errors
        .iter()
        .map(|error| match error.code() {
            Some(code) => format!("{} ({code})", error.message),
            None => error.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(PdlClientError::graph_ql(message))
}

#[async_trait]
impl PdlClient for PdlHttpClient {
    async fn hent_person(
        &self,
        ident: &str,
        token: &Token,
    ) -> Result<Option<PdlPerson>, PdlClientError> {
        let response = self
            .query::<HentPersonData>(HENT_PERSON_QUERY, ident, token)
            .await?;
        let person = check_errors(response)?.and_then(|data| data.hent_person);
        info!(funnet = person.is_some(), "hentet person fra pdl");
        Ok(person)
    }

    async fn hent_identer(&self, ident: &str, token: &Token) -> Result<Vec<String>, PdlClientError> {
        let response = self
            .query::<HentIdenterData>(HENT_IDENTER_QUERY, ident, token)
            .await?;
        Ok(check_errors(response)?
            .and_then(|data| data.hent_identer)
            .map(|liste| liste.identer.into_iter().map(|ident| ident.ident).collect())
            .unwrap_or_default())
    }
}

/// Expiry of cached PDL lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdlCacheTtl {
    pub person: Duration,
    pub identer: Duration,
}

impl Default for PdlCacheTtl {
    fn default() -> Self {
        Self {
            person: Duration::from_secs(60 * 60),
            identer: Duration::from_secs(24 * 60 * 60),
        }
    }
}

pub struct CachedPdlClient {
    inner: Arc<dyn PdlClient>,
    cache: Arc<dyn KeyValueCache>,
    ttl: PdlCacheTtl,
}

impl CachedPdlClient {
    pub fn new(inner: Arc<dyn PdlClient>, cache: Arc<dyn KeyValueCache>, ttl: PdlCacheTtl) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl PdlClient for CachedPdlClient {
    async fn hent_person(
        &self,
        ident: &str,
        token: &Token,
    ) -> Result<Option<PdlPerson>, PdlClientError> {
        let key = cache_key("pdlPerson", ident);
        if let Some(person) = get_json::<PdlPerson>(self.cache.as_ref(), &key).await {
            return Ok(Some(person));
        }
        let person = self.inner.hent_person(ident, token).await?;
        if let Some(found) = &person {
            put_json(self.cache.as_ref(), &key, found, self.ttl.person).await;
        }
        Ok(person)
    }

    async fn hent_identer(&self, ident: &str, token: &Token) -> Result<Vec<String>, PdlClientError> {
        let key = cache_key("pdlIdenter", ident);
        if let Some(identer) = get_json::<Vec<String>>(self.cache.as_ref(), &key).await {
            return Ok(identer);
        }
        let identer = self.inner.hent_identer(ident, token).await?;
        if !identer.is_empty() {
            put_json(self.cache.as_ref(), &key, &identer, self.ttl.identer).await;
        }
        Ok(identer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{Gradering, MockKeyValueCache, MockPdlClient};
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use serde_json::json;

    fn person_response(value: Value) -> GraphQlResponse<HentPersonData> {
        serde_json::from_value(value).expect("valid graphql response")
    }

    #[rstest]
    fn request_carries_ident_variable() {
        let request = GraphQlRequest {
            query: HENT_PERSON_QUERY,
            variables: Variables { ident: "12345678910" },
        };
        let value = serde_json::to_value(&request).expect("serialises");
        assert_eq!(value["variables"], json!({ "ident": "12345678910" }));
    }

    #[rstest]
    fn decodes_person() {
        let response = person_response(json!({
            "data": { "hentPerson": {
                "adressebeskyttelse": [{ "gradering": "FORTROLIG" }],
                "navn": [{ "fornavn": "KARI", "mellomnavn": null, "etternavn": "NORDMANN" }]
            } }
        }));
        let person = check_errors(response)
            .expect("no errors")
            .and_then(|data| data.hent_person)
            .expect("person");
        assert_eq!(
            person.adressebeskyttelse.first().map(|b| b.gradering),
            Some(Gradering::Fortrolig)
        );
        assert_eq!(person.fornavn(), Some("KARI"));
    }

    #[rstest]
    fn not_found_is_no_person() {
        let response = person_response(json!({
            "data": { "hentPerson": null },
            "errors": [{ "message": "Fant ikke person", "extensions": { "code": "not_found" } }]
        }));
        assert!(matches!(check_errors(response), Ok(None)));
    }

    #[rstest]
    fn other_errors_fail() {
        let response = person_response(json!({
            "data": null,
            "errors": [{ "message": "Ikke autentisert", "extensions": { "code": "unauthenticated" } }]
        }));
        assert_eq!(
            check_errors(response).map(|data| data.is_some()),
            Err(PdlClientError::graph_ql("Ikke autentisert (unauthenticated)"))
        );
    }

    #[rstest]
    fn decodes_identer() {
        let response: GraphQlResponse<HentIdenterData> = serde_json::from_value(json!({
            "data": { "hentIdenter": { "identer": [{ "ident": "12345678910" }, { "ident": "1000012345678" }] } }
        }))
        .expect("valid graphql response");
        let identer: Vec<String> = check_errors(response)
            .expect("no errors")
            .and_then(|data| data.hent_identer)
            .map(|liste| liste.identer.into_iter().map(|i| i.ident).collect())
            .unwrap_or_default();
        assert_eq!(identer, vec!["12345678910", "1000012345678"]);
    }

    #[rstest]
    #[tokio::test]
    async fn cached_person_skips_pdl() {
        let mut cache = MockKeyValueCache::new();
        cache
            .expect_get()
            .with(eq("pdlPerson::12345678910"))
            .returning(|_| Ok(Some(br#"{"adressebeskyttelse":[],"navn":[]}"#.to_vec())));
        let mut inner = MockPdlClient::new();
        inner.expect_hent_person().never();

        let client = CachedPdlClient::new(Arc::new(inner), Arc::new(cache), PdlCacheTtl::default());
        let person = client
            .hent_person("12345678910", &Token::new("t"))
            .await
            .expect("person");
        assert_eq!(person, Some(PdlPerson::default()));
    }

    #[rstest]
    #[tokio::test]
    async fn identer_are_cached_for_a_day() {
        let mut cache = MockKeyValueCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache
            .expect_set()
            .with(eq("pdlIdenter::12345678910"), always(), eq(Duration::from_secs(86_400)))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut inner = MockPdlClient::new();
        inner
            .expect_hent_identer()
            .returning(|_, _| Ok(vec!["12345678910".to_owned()]));

        let client = CachedPdlClient::new(Arc::new(inner), Arc::new(cache), PdlCacheTtl::default());
        let identer = client
            .hent_identer("12345678910", &Token::new("t"))
            .await
            .expect("identer");
        assert_eq!(identer, vec!["12345678910"]);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_person_is_not_cached() {
        let mut cache = MockKeyValueCache::new();
        cache.expect_get().returning(|_| Ok(None));
        cache.expect_set().never();
        let mut inner = MockPdlClient::new();
        inner.expect_hent_person().returning(|_, _| Ok(None));

        let client = CachedPdlClient::new(Arc::new(inner), Arc::new(cache), PdlCacheTtl::default());
        assert_eq!(
            client.hent_person("1", &Token::new("t")).await.expect("lookup"),
            None
        );
    }
}
