//! Driven port for the Fiks dokumentlager certificate.

use async_trait::async_trait;

use super::FiksClientError;

/// Port returning the certificate uploaded files are encrypted for.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DokumentlagerClient: Send + Sync {
    /// Fetch the X.509 certificate, PEM or DER encoded.
    async fn hent_dokumentlager_public_key(&self) -> Result<Vec<u8>, FiksClientError>;
}
