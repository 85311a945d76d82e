//! Application settings loaded via OrthoConfig.
//!
//! Every value can be given as an `INNSYN_*` environment variable or the
//! matching command line flag. Missing values fall back to defaults that
//! point at a local mock environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, bail};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FIKS_URL: &str = "http://localhost:8989";
const DEFAULT_DOKUMENTLAGER_URL: &str = "http://localhost:8989/dokumentlager/nedlasting/niva4";
const DEFAULT_SVARUT_URL: &str = "http://localhost:8989/svarut/forsendelse";
const DEFAULT_PDL_URL: &str = "http://localhost:8989/pdl/graphql";
const DEFAULT_PDL_AUDIENCE: &str = "local:pdl:pdl-api";
const DEFAULT_BEHANDLINGSNUMMER: &str = "B283";
const DEFAULT_NORG_URL: &str = "http://localhost:8989/norg2/api/v1";
const DEFAULT_CLAMAV_URL: &str = "http://localhost:8989/clamav/scan";
const DEFAULT_TEXAS_TOKEN: &str = "http://localhost:7164/api/v1/token";
const DEFAULT_TEXAS_EXCHANGE: &str = "http://localhost:7164/api/v1/token/exchange";
const DEFAULT_TEXAS_INTROSPECTION: &str = "http://localhost:7164/api/v1/introspect";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the service runs; decides test shortcuts and required secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Prod,
    Preprod,
    Dev,
    Local,
}

impl RuntimeEnv {
    pub fn is_prod(self) -> bool {
        self == Self::Prod
    }
}

impl FromStr for RuntimeEnv {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "prod" | "prod-gcp" => Ok(Self::Prod),
            "preprod" => Ok(Self::Preprod),
            "dev" | "dev-gcp" => Ok(Self::Dev),
            "local" | "mock" => Ok(Self::Local),
            other => Err(format!("unknown runtime environment: {other}")),
        }
    }
}

/// Upstream endpoints, credentials and feature switches.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INNSYN")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// `prod`, `preprod`, `dev` or `local`.
    pub runtime_env: Option<String>,
    /// Fiks digisos API base URL.
    pub fiks_url: Option<String>,
    pub integrasjon_id: Option<String>,
    pub integrasjon_passord: Option<String>,
    /// Download base for dokumentlager documents.
    pub dokumentlager_url: Option<String>,
    /// Download base for SvarUt forsendelser.
    pub svarut_url: Option<String>,
    pub pdl_url: Option<String>,
    pub pdl_audience: Option<String>,
    pub pdl_behandlingsnummer: Option<String>,
    pub norg_url: Option<String>,
    pub clamav_url: Option<String>,
    /// Skip virus scanning; only meant for local runs.
    #[ortho_config(default = false)]
    pub virus_scan_disabled: bool,
    pub texas_token_endpoint: Option<String>,
    pub texas_token_exchange_endpoint: Option<String>,
    pub texas_introspection_endpoint: Option<String>,
    /// Valkey URL; caching is off when unset.
    pub redis_url: Option<String>,
    /// Comma separated `navn;versjon` pairs of fagsystemer that publish
    /// vilkår and dokumentasjonkrav.
    pub fagsystem_versjoner: Option<String>,
    /// Log on the saksoversikt whether the kommune has innsyn in papirsøknader.
    #[ortho_config(default = false)]
    pub innsyn_i_papirsoknader: bool,
    /// Returned with `401` so the frontend can redirect.
    pub login_url: Option<String>,
    /// Timeout for every upstream call, in seconds.
    pub http_timeout_secs: Option<u64>,
}

fn parse_url(field: &str, value: Option<&str>, default: &str) -> Result<Url> {
    let raw = value.unwrap_or(default);
    Url::parse(raw).wrap_err_with(|| format!("invalid URL in {field}: {raw}"))
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .wrap_err_with(|| format!("invalid bind address: {raw}"))
    }

    pub fn runtime_env(&self) -> Result<RuntimeEnv> {
        match self.runtime_env.as_deref() {
            None => Ok(RuntimeEnv::Local),
            Some(raw) => raw.parse().map_err(color_eyre::eyre::Report::msg),
        }
    }

    pub fn fiks_url(&self) -> Result<Url> {
        parse_url("fiks_url", self.fiks_url.as_deref(), DEFAULT_FIKS_URL)
    }

    pub fn integrasjon_id(&self) -> &str {
        self.integrasjon_id.as_deref().unwrap_or_default()
    }

    pub fn integrasjon_passord(&self) -> &str {
        self.integrasjon_passord.as_deref().unwrap_or_default()
    }

    pub fn dokumentlager_url(&self) -> &str {
        self.dokumentlager_url
            .as_deref()
            .unwrap_or(DEFAULT_DOKUMENTLAGER_URL)
    }

    pub fn svarut_url(&self) -> &str {
        self.svarut_url.as_deref().unwrap_or(DEFAULT_SVARUT_URL)
    }

    pub fn pdl_url(&self) -> Result<Url> {
        parse_url("pdl_url", self.pdl_url.as_deref(), DEFAULT_PDL_URL)
    }

    pub fn pdl_audience(&self) -> &str {
        self.pdl_audience.as_deref().unwrap_or(DEFAULT_PDL_AUDIENCE)
    }

    pub fn pdl_behandlingsnummer(&self) -> &str {
        self.pdl_behandlingsnummer
            .as_deref()
            .unwrap_or(DEFAULT_BEHANDLINGSNUMMER)
    }

    pub fn norg_url(&self) -> Result<Url> {
        parse_url("norg_url", self.norg_url.as_deref(), DEFAULT_NORG_URL)
    }

    pub fn clamav_url(&self) -> Result<Url> {
        parse_url("clamav_url", self.clamav_url.as_deref(), DEFAULT_CLAMAV_URL)
    }

    pub fn texas_token_endpoint(&self) -> Result<Url> {
        parse_url(
            "texas_token_endpoint",
            self.texas_token_endpoint.as_deref(),
            DEFAULT_TEXAS_TOKEN,
        )
    }

    pub fn texas_token_exchange_endpoint(&self) -> Result<Url> {
        parse_url(
            "texas_token_exchange_endpoint",
            self.texas_token_exchange_endpoint.as_deref(),
            DEFAULT_TEXAS_EXCHANGE,
        )
    }

    pub fn texas_introspection_endpoint(&self) -> Result<Url> {
        parse_url(
            "texas_introspection_endpoint",
            self.texas_introspection_endpoint.as_deref(),
            DEFAULT_TEXAS_INTROSPECTION,
        )
    }

    /// Configured fagsystem versions, blanks dropped.
    pub fn fagsystem_versjoner(&self) -> Vec<String> {
        self.fagsystem_versjoner
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|versjon| !versjon.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Reject settings that cannot work in the configured environment.
    ///
    /// # Errors
    ///
    /// Fails when Fiks credentials are missing outside local runs, or when
    /// virus scanning is disabled in prod.
    pub fn validate(&self) -> Result<()> {
        let env = self.runtime_env()?;
        if env != RuntimeEnv::Local
            && (self.integrasjon_id().is_empty() || self.integrasjon_passord().is_empty())
        {
            bail!("INNSYN_INTEGRASJON_ID and INNSYN_INTEGRASJON_PASSORD must be set in {env:?}");
        }
        if env.is_prod() && self.virus_scan_disabled {
            bail!("virus scanning cannot be disabled in prod");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "INNSYN_BIND_ADDR",
        "INNSYN_PDL_BEHANDLINGSNUMMER",
        "INNSYN_REDIS_URL",
        "INNSYN_VIRUS_SCAN_DISABLED",
        "INNSYN_RUNTIME_ENV",
        "INNSYN_FIKS_URL",
        "INNSYN_INTEGRASJON_ID",
        "INNSYN_INTEGRASJON_PASSORD",
        "INNSYN_FAGSYSTEM_VERSJONER",
        "INNSYN_INNSYN_I_PAPIRSOKNADER",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("innsyn-api")]).expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_target_a_local_environment() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.runtime_env().expect("env"), RuntimeEnv::Local);
        assert_eq!(settings.fiks_url().expect("url").as_str(), "http://localhost:8989/");
        assert_eq!(settings.pdl_behandlingsnummer(), "B283");
        assert!(settings.fagsystem_versjoner().is_empty());
        assert!(!settings.innsyn_i_papirsoknader);
        assert!(settings.redis_url.is_none());
        assert!(settings.validate().is_ok());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.retain(|(name, _)| {
            !matches!(*name, "INNSYN_RUNTIME_ENV" | "INNSYN_FAGSYSTEM_VERSJONER")
        });
        vars.push(("INNSYN_RUNTIME_ENV", Some("preprod".to_owned())));
        vars.push((
            "INNSYN_FAGSYSTEM_VERSJONER",
            Some("Socio;10.1.16, mock-alt;1.0-MOCKVERSJON".to_owned()),
        ));
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        assert_eq!(settings.runtime_env().expect("env"), RuntimeEnv::Preprod);
        assert_eq!(
            settings.fagsystem_versjoner(),
            vec!["Socio;10.1.16".to_owned(), "mock-alt;1.0-MOCKVERSJON".to_owned()]
        );
        assert!(settings.validate().is_err());
    }

    #[rstest]
    #[case("prod", RuntimeEnv::Prod)]
    #[case("PROD-GCP", RuntimeEnv::Prod)]
    #[case("dev-gcp", RuntimeEnv::Dev)]
    #[case("mock", RuntimeEnv::Local)]
    fn runtime_env_names_are_parsed(#[case] raw: &str, #[case] expected: RuntimeEnv) {
        assert_eq!(raw.parse::<RuntimeEnv>(), Ok(expected));
    }

    #[rstest]
    fn invalid_urls_are_reported() {
        let _guard = lock_env(cleared());
        let mut settings = load_from_empty_args();
        settings.norg_url = Some("ikke en url".to_owned());
        assert!(settings.norg_url().is_err());
    }

    #[rstest]
    fn prod_refuses_disabled_virus_scanning() {
        let _guard = lock_env(cleared());
        let mut settings = load_from_empty_args();
        settings.runtime_env = Some("prod".to_owned());
        settings.integrasjon_id = Some("id".to_owned());
        settings.integrasjon_passord = Some("passord".to_owned());
        assert!(settings.validate().is_ok());

        settings.virus_scan_disabled = true;
        assert!(settings.validate().is_err());
    }
}
