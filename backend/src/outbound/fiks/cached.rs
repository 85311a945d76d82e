//! Caching decorators for the Fiks ports.
//!
//! Saker change often and are kept for a minute; documents and kommuneinfo
//! for an hour. An upload evicts the sak it was posted to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Token;
use crate::domain::digisos::{DigisosSak, KommuneInfo};
use crate::domain::ports::{
    CachePolicy, Ettersending, FiksClient, FiksClientError, KeyValueCache, KommuneInfoClient,
    KommuneInfoClientError,
};
use crate::outbound::cache::{cache_key, evict, get_json, get_raw, put_json, put_raw};

const DIGISOS_SAK: &str = "digisosSak";
const DOKUMENT: &str = "dokument";
const KOMMUNEINFO: &str = "kommuneinfo";

/// Expiry per cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiksCacheTtl {
    pub digisos_sak: Duration,
    pub dokument: Duration,
    pub kommune_info: Duration,
}

impl Default for FiksCacheTtl {
    fn default() -> Self {
        Self {
            digisos_sak: Duration::from_secs(60),
            dokument: Duration::from_secs(60 * 60),
            kommune_info: Duration::from_secs(60 * 60),
        }
    }
}

pub struct CachedFiksClient {
    inner: Arc<dyn FiksClient>,
    cache: Arc<dyn KeyValueCache>,
    ttl: FiksCacheTtl,
}

impl CachedFiksClient {
    pub fn new(inner: Arc<dyn FiksClient>, cache: Arc<dyn KeyValueCache>, ttl: FiksCacheTtl) -> Self {
        Self { inner, cache, ttl }
    }
}

fn dokument_key(dokumentlager_id: &str, versjon: Option<i64>) -> String {
    match versjon {
        Some(versjon) => cache_key(DOKUMENT, &format!("{dokumentlager_id}_{versjon}")),
        None => cache_key(DOKUMENT, dokumentlager_id),
    }
}

#[async_trait]
impl FiksClient for CachedFiksClient {
    async fn hent_digisos_sak(
        &self,
        fiks_digisos_id: &str,
        token: &Token,
        cache: CachePolicy,
    ) -> Result<DigisosSak, FiksClientError> {
        let key = cache_key(DIGISOS_SAK, fiks_digisos_id);
        if cache == CachePolicy::UseCache {
            if let Some(sak) = get_json(self.cache.as_ref(), &key).await {
                return Ok(sak);
            }
        }
        let sak = self.inner.hent_digisos_sak(fiks_digisos_id, token, cache).await?;
        put_json(self.cache.as_ref(), &key, &sak, self.ttl.digisos_sak).await;
        Ok(sak)
    }

    async fn hent_alle_digisos_saker(
        &self,
        token: &Token,
    ) -> Result<Vec<DigisosSak>, FiksClientError> {
        self.inner.hent_alle_digisos_saker(token).await
    }

    async fn hent_dokument(
        &self,
        fiks_digisos_id: &str,
        dokumentlager_id: &str,
        versjon: Option<i64>,
        token: &Token,
    ) -> Result<Vec<u8>, FiksClientError> {
        let key = dokument_key(dokumentlager_id, versjon);
        if let Some(bytes) = get_raw(self.cache.as_ref(), &key).await {
            return Ok(bytes);
        }
        let bytes = self
            .inner
            .hent_dokument(fiks_digisos_id, dokumentlager_id, versjon, token)
            .await?;
        put_raw(self.cache.as_ref(), &key, bytes.clone(), self.ttl.dokument).await;
        Ok(bytes)
    }

    async fn last_opp_nye_ettersendte_vedlegg(
        &self,
        ettersending: Ettersending,
        token: &Token,
    ) -> Result<(), FiksClientError> {
        let key = cache_key(DIGISOS_SAK, &ettersending.fiks_digisos_id);
        let result = self
            .inner
            .last_opp_nye_ettersendte_vedlegg(ettersending, token)
            .await;
        evict(self.cache.as_ref(), &key).await;
        result
    }
}

pub struct CachedKommuneInfoClient {
    inner: Arc<dyn KommuneInfoClient>,
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl CachedKommuneInfoClient {
    pub fn new(inner: Arc<dyn KommuneInfoClient>, cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl KommuneInfoClient for CachedKommuneInfoClient {
    async fn hent_kommune_info(
        &self,
        kommunenummer: &str,
    ) -> Result<KommuneInfo, KommuneInfoClientError> {
        let key = cache_key(KOMMUNEINFO, kommunenummer);
        if let Some(info) = get_json(self.cache.as_ref(), &key).await {
            return Ok(info);
        }
        let info = self.inner.hent_kommune_info(kommunenummer).await?;
        put_json(self.cache.as_ref(), &key, &info, self.ttl).await;
        Ok(info)
    }
}
