//! Domain ports for the hexagonal boundary.
//!
//! Every upstream the service talks to is reached through one of these
//! traits, so domain services can be tested with mocks.

mod macros;
pub(crate) use macros::define_port_error;

mod document_encryptor;
mod dokumentlager_client;
mod fiks_client;
mod key_value_cache;
mod kommune_info_client;
mod norg_client;
mod pdf;
mod pdl_client;
mod token;
mod virus_scanner;

#[cfg(test)]
pub use document_encryptor::MockDocumentEncryptor;
pub use document_encryptor::{DocumentEncryptor, EncryptionError};
pub use dokumentlager_client::DokumentlagerClient;
#[cfg(test)]
pub use dokumentlager_client::MockDokumentlagerClient;
#[cfg(test)]
pub use fiks_client::MockFiksClient;
pub use fiks_client::{CachePolicy, Ettersending, FiksClient, FiksClientError, KryptertFil};
#[cfg(test)]
pub use key_value_cache::MockKeyValueCache;
pub use key_value_cache::{CacheError, KeyValueCache};
#[cfg(test)]
pub use kommune_info_client::MockKommuneInfoClient;
pub use kommune_info_client::{KommuneInfoClient, KommuneInfoClientError};
#[cfg(test)]
pub use norg_client::MockNorgClient;
pub use norg_client::{NavEnhet, NorgClient, NorgClientError};
#[cfg(test)]
pub use pdf::{MockPdfGenerator, MockPdfInspector};
pub use pdf::{PdfDocument, PdfGenerator, PdfGeneratorError, PdfInspection, PdfInspector, PdfLine};
#[cfg(test)]
pub use pdl_client::MockPdlClient;
pub use pdl_client::{Adressebeskyttelse, Gradering, PdlClient, PdlClientError, PdlNavn, PdlPerson};
#[cfg(test)]
pub use token::{MockTokenExchanger, MockTokenIntrospector};
pub use token::{TokenError, TokenExchanger, TokenIntrospection, TokenIntrospector};
#[cfg(test)]
pub use virus_scanner::MockVirusScanner;
pub use virus_scanner::{VirusScanError, VirusScanner};
