//! HTTP inbound adapter exposing the innsyn REST endpoints.
//!
//! Every `/api` handler authenticates through [`auth::BearerUser`] and
//! checks tilgang before asking the domain for data.

pub mod auth;
pub mod error;
pub mod health;
pub mod oppgaver;
pub mod saker;
pub mod soknad;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tilgang;
pub mod utbetalinger;
pub mod vedlegg;

use actix_web::{HttpResponse, web};
use serde::Serialize;

pub use error::ApiResult;

/// Base path of the v1 endpoints.
pub const API_V1: &str = "/api/v1/innsyn";
/// Base path of the v2 utbetalinger endpoint.
pub const API_V2_UTBETALINGER: &str = "/api/v2/innsyn/utbetalinger";

/// `200` with the items as JSON, or `204` when there are none.
pub fn json_or_no_content<T: Serialize>(items: &[T]) -> HttpResponse {
    if items.is_empty() {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::Ok().json(items)
    }
}

/// Register every v1 handler on a scope mounted at [`API_V1`].
///
/// Static paths are registered before the `{fiksDigisosId}` routes.
pub fn configure_v1(cfg: &mut web::ServiceConfig) {
    cfg.service(saker::hent_alle_saker)
        .service(saker::hent_saks_detaljer)
        .service(saker::har_soknader_med_innsyn)
        .service(tilgang::har_tilgang)
        .service(utbetalinger::hent_utbetalinger)
        .service(utbetalinger::hent_nye_utbetalinger)
        .service(utbetalinger::hent_tidligere_utbetalinger)
        .service(soknad::hent_soknads_status)
        .service(soknad::hent_saks_statuser)
        .service(soknad::hent_hendelser)
        .service(soknad::hent_hendelser_beta)
        .service(soknad::hent_forelopig_svar)
        .service(soknad::hent_kommune_info)
        .service(oppgaver::hent_oppgaver)
        .service(oppgaver::hent_oppgave_med_id)
        .service(oppgaver::hent_vilkar)
        .service(oppgaver::hent_dokumentasjonkrav)
        .service(oppgaver::hent_dokumentasjonkrav_med_id)
        .service(oppgaver::har_levert_dokumentasjonkrav)
        .service(oppgaver::fagsystem_har_dokumentasjonkrav)
        .service(vedlegg::hent_vedlegg)
        .service(vedlegg::send_vedlegg);
}

/// Register the v2 handlers on a scope mounted at [`API_V2_UTBETALINGER`].
pub fn configure_v2_utbetalinger(cfg: &mut web::ServiceConfig) {
    cfg.service(utbetalinger::hent_utbetalinger_v2);
}
