//! Driven port for encrypting files before they leave the service.

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while encrypting.
    pub enum EncryptionError {
        /// The certificate could not be parsed.
        Certificate { message: String } => "ugyldig sertifikat: {message}",
        /// The CMS envelope could not be produced.
        Encrypt { message: String } => "kryptering feilet: {message}",
    }
}

/// Port for CMS envelope encryption towards one recipient certificate.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentEncryptor: Send + Sync {
    fn encrypt(&self, data: &[u8], certificate: &[u8]) -> Result<Vec<u8>, EncryptionError>;
}
