//! Backend entry-point: loads settings, wires the upstream adapters and
//! serves the innsyn REST endpoints.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use innsyn_api::inbound::http::health::HealthState;
use server::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load INNSYN_* settings")?;
    let config = ServerConfig::new(settings)?;
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::build_metrics());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await.wrap_err("server terminated with an error")
}
