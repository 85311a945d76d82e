//! Reqwest-backed adapter for the Texas token sidecar.
//!
//! Texas fronts ID-porten introspection, TokenX exchange and Maskinporten.
//! The adapter owns the request bodies and error decoding only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http_support::{body_preview, build_client};
use crate::domain::Token;
use crate::domain::ports::{TokenError, TokenExchanger, TokenIntrospection, TokenIntrospector};

/// Maskinporten scope target for the Fiks APIs.
pub const MASKINPORTEN_TARGET: &str = "ks:fiks";

/// The three Texas endpoints, as injected by the platform.
#[derive(Debug, Clone)]
pub struct TexasEndpoints {
    /// `NAIS_TOKEN_ENDPOINT`, machine-to-machine tokens.
    pub token: Url,
    /// `NAIS_TOKEN_EXCHANGE_ENDPOINT`, on-behalf-of tokens.
    pub token_exchange: Url,
    /// `NAIS_TOKEN_INTROSPECTION_ENDPOINT`.
    pub introspection: Url,
}

pub struct TexasHttpClient {
    client: Client,
    endpoints: TexasEndpoints,
}

impl TexasHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoints: TexasEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoints,
        })
    }

    async fn post<B: Serialize + Sync>(&self, url: &Url, body: &B) -> Result<Vec<u8>, TokenError> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| TokenError::transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TokenError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        Ok(bytes.to_vec())
    }

    async fn token(&self, url: &Url, request: &TokenRequest<'_>) -> Result<Token, TokenError> {
        let body = self.post(url, request).await?;
        let token = parse_token_response(&body)?;
        info!(identity_provider = request.identity_provider, "hentet token fra Texas");
        Ok(token)
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    identity_provider: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct IntrospectionRequest<'a> {
    identity_provider: &'a str,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[async_trait]
impl TokenIntrospector for TexasHttpClient {
    async fn introspect(&self, token: &Token) -> Result<TokenIntrospection, TokenError> {
        let body = self
            .post(
                &self.endpoints.introspection,
                &IntrospectionRequest {
                    identity_provider: "idporten",
                    token: token.as_str(),
                },
            )
            .await?;
        let introspection: TokenIntrospection = serde_json::from_slice(&body)
            .map_err(|err| TokenError::decode(format!("ugyldig introspeksjonssvar: {err}")))?;
        debug!(active = introspection.active, acr = ?introspection.acr, "introspekterte token");
        Ok(introspection)
    }
}

#[async_trait]
impl TokenExchanger for TexasHttpClient {
    async fn tokenx(&self, target: &str, user_token: &Token) -> Result<Token, TokenError> {
        self.token(
            &self.endpoints.token_exchange,
            &TokenRequest {
                identity_provider: "tokenx",
                target,
                user_token: Some(user_token.as_str()),
            },
        )
        .await
    }

    async fn maskinporten(&self) -> Result<Token, TokenError> {
        self.token(
            &self.endpoints.token,
            &TokenRequest {
                identity_provider: "maskinporten",
                target: MASKINPORTEN_TARGET,
                user_token: None,
            },
        )
        .await
    }
}

fn parse_token_response(body: &[u8]) -> Result<Token, TokenError> {
    let decoded: TokenResponse = serde_json::from_slice(body)
        .map_err(|err| TokenError::decode(format!("ugyldig tokensvar: {err}")))?;
    Ok(Token::new(decoded.access_token))
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TokenError {
    let message = match serde_json::from_slice::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(TokenErrorResponse { error, .. }) => error,
        Err(_) => body_preview(body),
    };
    TokenError::status(status.as_u16(), message)
}
