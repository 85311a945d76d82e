//! Driven port for scanning uploaded files.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Outcome of a scan that must stop the upload.
    pub enum VirusScanError {
        /// The scanner reported the file as infected.
        VirusFound { filnavn: String } => "fant virus i {filnavn}",
    }
}

/// Port for virus scanning one file.
///
/// Implementations treat an unreachable scanner as a clean result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, filnavn: &str, data: &[u8]) -> Result<(), VirusScanError>;
}
