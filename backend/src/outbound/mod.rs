//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **texas**: token introspection and exchange through the NAIS sidecar
//! - **fiks**: DigisosApi and dokumentlager over HTTP, plus cache decorators
//! - **pdl** / **norg**: person and NAV office lookups
//! - **virus_scan**: ClamAV REST scanner
//! - **crypto** / **pdf**: CMS encryption and PDF rendering
//! - **cache**: Valkey-backed key/value store shared by the decorators
//!
//! Adapters translate between domain types and wire formats. They contain
//! no business logic.

pub mod cache;
pub mod crypto;
pub mod fiks;
pub(crate) mod http_support;
pub mod norg;
pub mod pdf;
pub mod pdl;
pub mod texas;
pub mod virus_scan;

pub use self::http_support::RetryPolicy;
