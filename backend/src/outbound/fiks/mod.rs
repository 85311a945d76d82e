//! Fiks digisos API adapters.

mod cached;
mod http_client;

pub use cached::{CachedFiksClient, CachedKommuneInfoClient, FiksCacheTtl};
pub use http_client::{FiksHttpClient, FiksHttpSettings};
