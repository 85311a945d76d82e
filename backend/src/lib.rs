//! Backend library modules.
//!
//! - [`domain`]: the innsyn read model and services.
//! - [`inbound`]: actix-web handlers.
//! - [`outbound`]: Fiks, PDL, NORG, Texas, ClamAV and Valkey adapters.
//! - [`middleware`]: request correlation.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
