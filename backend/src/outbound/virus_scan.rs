//! ClamAV REST adapter.
//!
//! The scanner answers `[{ "Filename": ..., "Result": "OK" | "FOUND" }]`.
//! Anything other than a single `FOUND` counts as clean, including an
//! unreachable scanner.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::http_support::{RetryPolicy, build_client, status_message, with_call_id};
use crate::domain::ports::{VirusScanError, VirusScanner};

/// Outside prod, files named like this are reported as infected.
pub const VIRUSTEST_PREFIX: &str = "virustest";

/// Scanner settings.
#[derive(Debug, Clone)]
pub struct VirusScanSettings {
    pub endpoint: Url,
    pub enabled: bool,
    /// Disables the [`VIRUSTEST_PREFIX`] shortcut.
    pub is_prod: bool,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

pub struct ClamAvVirusScanner {
    client: Client,
    endpoint: Url,
    enabled: bool,
    is_prod: bool,
    retry: RetryPolicy,
}

impl ClamAvVirusScanner {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: VirusScanSettings) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            endpoint: settings.endpoint,
            enabled: settings.enabled,
            is_prod: settings.is_prod,
            retry: settings.retry,
        })
    }

    async fn put(&self, data: &[u8]) -> Result<Vec<ScanResult>, String> {
        let response = with_call_id(self.client.put(self.endpoint.clone()))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| err.to_string())?;
        if !status.is_success() {
            return Err(status_message(status, body.as_ref()));
        }
        serde_json::from_slice(&body).map_err(|err| format!("ugyldig svar fra virusscanner: {err}"))
    }

    async fn is_infected(&self, filnavn: &str, data: &[u8]) -> bool {
        if !self.is_prod && filnavn.starts_with(VIRUSTEST_PREFIX) {
            return true;
        }
        info!(bytes = data.len(), "scanner fil for virus");
        match self.retry.run("virusscan", |_| true, || self.put(data)).await {
            Ok(results) => verdict(&results),
            Err(err) => {
                warn!(error = %err, "kunne ikke scanne opplastet fil");
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScanResult {
    #[serde(default)]
    filename: Option<String>,
    result: ScanVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum ScanVerdict {
    Found,
    Ok,
    Error,
}

fn verdict(results: &[ScanResult]) -> bool {
    let [result] = results else {
        warn!(
            antall = results.len(),
            "virusscan returnerte uventet respons, forventet lengde er 1"
        );
        return false;
    };
    debug!(filename = ?result.filename, verdict = ?result.result, "fikk scan-resultat");
    match result.result {
        ScanVerdict::Ok => {
            info!("ingen virus i fil");
            false
        }
        ScanVerdict::Found => {
            warn!("fant virus i fil forsøkt opplastet");
            true
        }
        ScanVerdict::Error => {
            warn!("virusscanner rapporterte feil, regnes som ren");
            false
        }
    }
}

#[async_trait]
impl VirusScanner for ClamAvVirusScanner {
    async fn scan(&self, filnavn: &str, data: &[u8]) -> Result<(), VirusScanError> {
        if !self.enabled {
            warn!("virusscanning er ikke aktivert");
            return Ok(());
        }
        if self.is_infected(filnavn, data).await {
            return Err(VirusScanError::virus_found(filnavn));
        }
        Ok(())
    }
}
