//! Saksoversikt handlers.
//!
//! ```text
//! GET /api/v1/innsyn/saker
//! GET /api/v1/innsyn/sak/{fiksDigisosId}/detaljer
//! GET /api/v1/innsyn/harSoknaderMedInnsyn
//! ```

use actix_web::{get, web};
use tracing::info;

use crate::domain::saksoversikt::{SaksDetaljerResponse, SaksListeResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::error::FrontendErrorMessage;
use crate::inbound::http::state::HttpState;

/// Every søknad of the user, most recently changed first.
#[utoipa::path(
    get,
    path = "/api/v1/innsyn/saker",
    responses(
        (status = 200, description = "Saker", body = [SaksListeResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "No access", body = FrontendErrorMessage),
        (status = 503, description = "Fiks unavailable", body = FrontendErrorMessage)
    ),
    tags = ["saksoversikt"],
    operation_id = "hentAlleSaker"
)]
#[get("/saker")]
pub async fn hent_alle_saker(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<Vec<SaksListeResponse>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let saker = state.saksoversikt.hent_alle_saker(&user).await?;
    if saker.is_empty() {
        info!("fant ingen saker for bruker");
    } else {
        info!(antall = saker.len(), "hentet alle søknader for bruker");
    }
    Ok(web::Json(saker))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/sak/{fiksDigisosId}/detaljer",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Saksdetaljer", body = SaksDetaljerResponse),
        (status = 404, description = "Unknown sak", body = FrontendErrorMessage)
    ),
    tags = ["saksoversikt"],
    operation_id = "hentSaksDetaljer"
)]
#[get("/sak/{fiks_digisos_id}/detaljer")]
pub async fn hent_saks_detaljer(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<SaksDetaljerResponse>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let detaljer = state
        .saksoversikt
        .hent_saks_detaljer(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(detaljer))
}

/// Whether the user has a recently changed søknad in a kommune with innsyn.
#[utoipa::path(
    get,
    path = "/api/v1/innsyn/harSoknaderMedInnsyn",
    responses(
        (status = 200, description = "Søknader med innsyn finnes", body = bool),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "No access", body = FrontendErrorMessage)
    ),
    tags = ["saksoversikt"],
    operation_id = "harSoknaderMedInnsyn"
)]
#[get("/harSoknaderMedInnsyn")]
pub async fn har_soknader_med_innsyn(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<bool>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let har_innsyn = state.saksoversikt.har_soknader_med_innsyn(&user).await?;
    Ok(web::Json(har_innsyn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Gradering;
    use crate::domain::test_fixtures::{dokumenter, sak, sak_json};
    use crate::inbound::http::test_utils::{LOGIN_URL, bearer, test_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    const SENDT: i64 = 1_709_373_600_000;

    async fn get(uri: &str, gradering: Gradering, authorized: bool) -> (StatusCode, Value) {
        let state = test_state(
            vec![sak(sak_json(SENDT))],
            dokumenter(json!([])),
            gradering,
        );
        let app = test::init_service(
            App::new().app_data(state).service(
                web::scope("/api/v1/innsyn")
                    .service(hent_alle_saker)
                    .service(hent_saks_detaljer)
                    .service(har_soknader_med_innsyn),
            ),
        )
        .await;
        let mut req = test::TestRequest::get().uri(uri);
        if authorized {
            req = req.insert_header(bearer());
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn lists_saker_for_the_user() {
        let (status, body) = get("/api/v1/innsyn/saker", Gradering::Ugradert, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["fiksDigisosId"], "123");
        assert_eq!(body[0]["kilde"], "innsyn-api");
    }

    #[actix_web::test]
    async fn missing_token_is_401_with_login_url() {
        let (status, body) = get("/api/v1/innsyn/saker", Gradering::Ugradert, false).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["loginUrl"], LOGIN_URL);
    }

    #[rstest]
    #[case::kode6(Gradering::StrengtFortrolig)]
    #[case::kode6_utland(Gradering::StrengtFortroligUtland)]
    #[case::kode7(Gradering::Fortrolig)]
    #[actix_web::test]
    async fn fortrolige_users_are_forbidden(#[case] gradering: Gradering) {
        let (status, body) = get("/api/v1/innsyn/saker", gradering, true).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["type"], "tilgang_error");
    }

    #[actix_web::test]
    async fn unknown_sak_is_404() {
        let (status, body) =
            get("/api/v1/innsyn/sak/ukjent/detaljer", Gradering::Ugradert, true).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "fiks_error");
    }

    #[actix_web::test]
    async fn detaljer_reports_status() {
        let (status, body) =
            get("/api/v1/innsyn/sak/123/detaljer", Gradering::Ugradert, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fiksDigisosId"], "123");
        assert_eq!(body["antallNyeOppgaver"], 0);
    }

    #[actix_web::test]
    async fn har_soknader_med_innsyn_for_recent_sak() {
        let (status, body) =
            get("/api/v1/innsyn/harSoknaderMedInnsyn", Gradering::Ugradert, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Bool(true));
    }

    #[actix_web::test]
    async fn har_soknader_med_innsyn_needs_tilgang() {
        let (status, _) = get(
            "/api/v1/innsyn/harSoknaderMedInnsyn",
            Gradering::StrengtFortrolig,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
