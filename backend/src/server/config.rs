//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use color_eyre::eyre::Result;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use super::settings::AppSettings;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) settings: AppSettings,
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Validate the settings and resolve the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are unusable in the configured
    /// runtime environment or the bind address does not parse.
    pub fn new(settings: AppSettings) -> Result<Self> {
        settings.validate()?;
        let bind_addr = settings.bind_addr()?;
        Ok(Self {
            settings,
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
