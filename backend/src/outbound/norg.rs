//! NORG2 adapter resolving enhetsnummer to NAV offices.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use tracing::{debug, info, warn};

use super::cache::{cache_key, get_json, put_json};
use super::http_support::{build_client, status_message, with_call_id};
use crate::domain::ports::{KeyValueCache, NavEnhet, NorgClient, NorgClientError};

pub struct NorgHttpClient {
    client: Client,
    base_url: Url,
}

impl NorgHttpClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url,
        })
    }
}

fn enhet_url(base: &Url, enhetsnr: &str) -> Result<Url, NorgClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| NorgClientError::transport(format!("ugyldig norg-url: {base}")))?
        .pop_if_empty()
        .extend(["enhet", enhetsnr]);
    Ok(url)
}

#[async_trait]
impl NorgClient for NorgHttpClient {
    async fn hent_nav_enhet(&self, enhetsnr: &str) -> Result<NavEnhet, NorgClientError> {
        debug!(enhetsnr, "henter NAV-enhet fra NORG2");
        let response = with_call_id(self.client.get(enhet_url(&self.base_url, enhetsnr)?))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| NorgClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| NorgClientError::transport(err.to_string()))?;
        if !status.is_success() {
            warn!(enhetsnr, status = status.as_u16(), "kall mot NORG2 feilet");
            return Err(NorgClientError::status(
                status.as_u16(),
                status_message(status, body.as_ref()),
            ));
        }
        let enhet: NavEnhet = serde_json::from_slice(&body)
            .map_err(|err| NorgClientError::decode(err.to_string()))?;
        info!(enhetsnr, "hentet NAV-enhet fra NORG2");
        Ok(enhet)
    }
}

pub struct CachedNorgClient {
    inner: Arc<dyn NorgClient>,
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl CachedNorgClient {
    pub fn new(inner: Arc<dyn NorgClient>, cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl NorgClient for CachedNorgClient {
    async fn hent_nav_enhet(&self, enhetsnr: &str) -> Result<NavEnhet, NorgClientError> {
        let key = cache_key("navenhet", enhetsnr);
        if let Some(enhet) = get_json(self.cache.as_ref(), &key).await {
            return Ok(enhet);
        }
        let enhet = self.inner.hent_nav_enhet(enhetsnr).await?;
        put_json(self.cache.as_ref(), &key, &enhet, self.ttl).await;
        Ok(enhet)
    }
}
