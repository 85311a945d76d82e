//! Builders for the upstream adapters and the HTTP state wired over them.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

use innsyn_api::domain::ports::{
    DokumentlagerClient, FiksClient, KeyValueCache, KommuneInfoClient, NorgClient, PdlClient,
    TokenIntrospector,
};
use innsyn_api::domain::support::DokumentUrls;
use innsyn_api::inbound::http::state::{HttpState, HttpStatePorts, HttpStateServices};
use innsyn_api::outbound::RetryPolicy;
use innsyn_api::outbound::cache::{DisabledCache, RedisCache, RedisCacheConfig};
use innsyn_api::outbound::crypto::CmsDocumentEncryptor;
use innsyn_api::outbound::fiks::{
    CachedFiksClient, CachedKommuneInfoClient, FiksCacheTtl, FiksHttpClient, FiksHttpSettings,
};
use innsyn_api::outbound::norg::{CachedNorgClient, NorgHttpClient};
use innsyn_api::outbound::pdf::{LopdfGenerator, LopdfInspector};
use innsyn_api::outbound::pdl::{CachedPdlClient, PdlCacheTtl, PdlHttpClient, PdlHttpSettings};
use innsyn_api::outbound::texas::{TexasEndpoints, TexasHttpClient};
use innsyn_api::outbound::virus_scan::{ClamAvVirusScanner, VirusScanSettings};

use super::ServerConfig;
use super::settings::AppSettings;

const NORG_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Valkey when a URL is configured, otherwise a cache that stores nothing.
fn build_cache(settings: &AppSettings) -> Result<Arc<dyn KeyValueCache>> {
    match settings.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisCache::new(&RedisCacheConfig::new(url))
                .wrap_err("failed to configure Valkey cache")?;
            info!("caching upstream responses in Valkey");
            Ok(Arc::new(cache))
        }
        None => {
            warn!("no INNSYN_REDIS_URL configured, upstream responses are not cached");
            Ok(Arc::new(DisabledCache))
        }
    }
}

fn build_texas(settings: &AppSettings) -> Result<Arc<TexasHttpClient>> {
    let endpoints = TexasEndpoints {
        token: settings.texas_token_endpoint()?,
        token_exchange: settings.texas_token_exchange_endpoint()?,
        introspection: settings.texas_introspection_endpoint()?,
    };
    let client = TexasHttpClient::new(endpoints, settings.http_timeout())
        .wrap_err("failed to build Texas client")?;
    Ok(Arc::new(client))
}

/// Fiks adapters: the cached digisos client, the dokumentlager key client
/// and the cached kommuneinfo client.
fn build_fiks(
    settings: &AppSettings,
    texas: Arc<TexasHttpClient>,
    cache: Arc<dyn KeyValueCache>,
) -> Result<(
    Arc<dyn FiksClient>,
    Arc<dyn DokumentlagerClient>,
    Arc<dyn KommuneInfoClient>,
)> {
    let http = Arc::new(
        FiksHttpClient::new(
            FiksHttpSettings {
                base_url: settings.fiks_url()?,
                integrasjon_id: settings.integrasjon_id().to_owned(),
                integrasjon_passord: settings.integrasjon_passord().to_owned(),
                timeout: settings.http_timeout(),
                retry: RetryPolicy::default(),
            },
            texas,
        )
        .wrap_err("failed to build Fiks client")?,
    );
    let ttl = FiksCacheTtl::default();
    let fiks: Arc<dyn FiksClient> = Arc::new(CachedFiksClient::new(http.clone(), cache.clone(), ttl));
    let kommune_info: Arc<dyn KommuneInfoClient> = Arc::new(CachedKommuneInfoClient::new(
        http.clone(),
        cache,
        ttl.kommune_info,
    ));
    let dokumentlager: Arc<dyn DokumentlagerClient> = http;
    Ok((fiks, dokumentlager, kommune_info))
}

fn build_pdl(
    settings: &AppSettings,
    texas: Arc<TexasHttpClient>,
    cache: Arc<dyn KeyValueCache>,
) -> Result<Arc<dyn PdlClient>> {
    let http = PdlHttpClient::new(
        PdlHttpSettings {
            endpoint: settings.pdl_url()?,
            audience: settings.pdl_audience().to_owned(),
            behandlingsnummer: settings.pdl_behandlingsnummer().to_owned(),
            timeout: settings.http_timeout(),
        },
        texas,
    )
    .wrap_err("failed to build PDL client")?;
    Ok(Arc::new(CachedPdlClient::new(
        Arc::new(http),
        cache,
        PdlCacheTtl::default(),
    )))
}

fn build_norg(settings: &AppSettings, cache: Arc<dyn KeyValueCache>) -> Result<Arc<dyn NorgClient>> {
    let http = NorgHttpClient::new(settings.norg_url()?, settings.http_timeout())
        .wrap_err("failed to build NORG client")?;
    Ok(Arc::new(CachedNorgClient::new(
        Arc::new(http),
        cache,
        NORG_CACHE_TTL,
    )))
}

fn build_virus_scanner(settings: &AppSettings) -> Result<ClamAvVirusScanner> {
    let enabled = !settings.virus_scan_disabled;
    if !enabled {
        warn!("virus scanning is disabled");
    }
    ClamAvVirusScanner::new(VirusScanSettings {
        endpoint: settings.clamav_url()?,
        enabled,
        is_prod: settings.runtime_env()?.is_prod(),
        timeout: settings.http_timeout(),
        retry: RetryPolicy::default(),
    })
    .wrap_err("failed to build virus scanner")
}

/// Build every upstream adapter from the settings.
pub(super) fn build_ports(config: &ServerConfig) -> Result<(Arc<dyn TokenIntrospector>, HttpStatePorts)> {
    let settings = config.settings();
    let cache = build_cache(settings)?;
    let texas = build_texas(settings)?;
    let (fiks, dokumentlager, kommune_info) = build_fiks(settings, texas.clone(), cache.clone())?;
    let pdl = build_pdl(settings, texas.clone(), cache.clone())?;
    let norg = build_norg(settings, cache)?;
    let virus_scanner = build_virus_scanner(settings)?;

    let ports = HttpStatePorts {
        fiks,
        dokumentlager,
        kommune_info,
        pdl,
        norg,
        virus_scanner: Arc::new(virus_scanner),
        encryptor: Arc::new(CmsDocumentEncryptor),
        pdf_generator: Arc::new(LopdfGenerator),
        pdf_inspector: Arc::new(LopdfInspector),
        clock: Arc::new(mockable::DefaultClock),
        urls: DokumentUrls {
            dokumentlager: settings.dokumentlager_url().to_owned(),
            svarut: settings.svarut_url().to_owned(),
        },
        fagsystem_versjoner: settings.fagsystem_versjoner(),
        innsyn_i_papirsoknader: settings.innsyn_i_papirsoknader,
    };
    let introspector: Arc<dyn TokenIntrospector> = texas;
    Ok((introspector, ports))
}

/// Build the shared HTTP state over the configured adapters.
pub(super) fn build_http_state(config: &ServerConfig) -> Result<web::Data<HttpState>> {
    let (introspector, ports) = build_ports(config)?;
    let services = HttpStateServices::from_ports(ports);
    Ok(web::Data::new(HttpState::new(
        introspector,
        config.settings().login_url.clone(),
        services,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use env_lock::lock_env;
    use rstest::rstest;
    use std::ffi::OsString;

    use ortho_config::OrthoConfig;

    fn local_settings() -> AppSettings {
        let _guard = lock_env([
            ("INNSYN_RUNTIME_ENV", None::<String>),
            ("INNSYN_REDIS_URL", None::<String>),
            ("INNSYN_FAGSYSTEM_VERSJONER", Some("Socio;10.1.16".to_owned())),
            ("INNSYN_LOGIN_URL", Some("https://login.test".to_owned())),
        ]);
        AppSettings::load_from_iter([OsString::from("innsyn-api")]).expect("settings")
    }

    #[rstest]
    #[tokio::test]
    async fn local_settings_build_the_whole_state() {
        let config = ServerConfig::new(local_settings()).expect("config");
        let state = build_http_state(&config).expect("state");
        assert_eq!(state.login_url.as_deref(), Some("https://login.test"));
    }

    #[rstest]
    #[tokio::test]
    async fn cache_is_disabled_without_redis_url() {
        let settings = local_settings();
        let cache = build_cache(&settings).expect("cache");
        cache
            .set("nøkkel", b"verdi".to_vec(), Duration::from_secs(1))
            .await
            .expect("set");
        assert_eq!(cache.get("nøkkel").await.expect("get"), None);
    }
}
