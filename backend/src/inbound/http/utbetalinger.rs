//! Utbetalinger across all saker of the user.
//!
//! ```text
//! GET /api/v1/innsyn/utbetalinger?month=3
//! GET /api/v1/innsyn/utbetalinger/nye
//! GET /api/v1/innsyn/utbetalinger/tidligere
//! GET /api/v2/innsyn/utbetalinger
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::utbetalinger::{
    KommendeOgUtbetalteUtbetalingerResponse, UtbetalingDto, UtbetalingerResponse,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::state::HttpState;

const DEFAULT_MONTHS: u32 = 3;

fn default_month() -> u32 {
    DEFAULT_MONTHS
}

/// Look-back window of the utbetalte listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Months back from today; defaults to 3.
    #[serde(default = "default_month")]
    pub month: u32,
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/utbetalinger",
    params(MonthQuery),
    responses((status = 200, description = "Utbetalte per måned", body = [UtbetalingerResponse])),
    tags = ["utbetalinger"],
    operation_id = "hentUtbetalinger"
)]
#[get("/utbetalinger")]
pub async fn hent_utbetalinger(
    state: web::Data<HttpState>,
    user: BearerUser,
    query: web::Query<MonthQuery>,
) -> ApiResult<web::Json<Vec<UtbetalingerResponse>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let utbetalinger = state
        .utbetalinger
        .hent_utbetalte_utbetalinger(&user, query.month)
        .await?;
    Ok(web::Json(utbetalinger))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/utbetalinger/nye",
    responses((status = 200, description = "Kommende per måned", body = [KommendeOgUtbetalteUtbetalingerResponse])),
    tags = ["utbetalinger"],
    operation_id = "hentNyeUtbetalinger"
)]
#[get("/utbetalinger/nye")]
pub async fn hent_nye_utbetalinger(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<Vec<KommendeOgUtbetalteUtbetalingerResponse>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    Ok(web::Json(
        state.utbetalinger.hent_nye_utbetalinger(&user).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/utbetalinger/tidligere",
    responses((status = 200, description = "Tidligere per måned", body = [KommendeOgUtbetalteUtbetalingerResponse])),
    tags = ["utbetalinger"],
    operation_id = "hentTidligereUtbetalinger"
)]
#[get("/utbetalinger/tidligere")]
pub async fn hent_tidligere_utbetalinger(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<Vec<KommendeOgUtbetalteUtbetalingerResponse>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    Ok(web::Json(
        state.utbetalinger.hent_tidligere_utbetalinger(&user).await?,
    ))
}

/// Flat list, one entry per utbetalingsreferanse.
#[utoipa::path(
    get,
    path = "/api/v2/innsyn/utbetalinger",
    responses((status = 200, description = "Utbetalinger", body = [UtbetalingDto])),
    tags = ["utbetalinger"],
    operation_id = "hentUtbetalingerV2"
)]
#[get("")]
pub async fn hent_utbetalinger_v2(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<Vec<UtbetalingDto>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    Ok(web::Json(state.utbetalinger.hent_utbetalinger(&user).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Gradering;
    use crate::domain::test_fixtures::{dokumenter, sak, sak_json};
    use crate::inbound::http::test_utils::{bearer, test_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::{Value, json};

    /// 2024-03-01T10:00:00Z
    const SENDT: i64 = 1_709_287_200_000;

    async fn get(uri: &str) -> (StatusCode, Value) {
        let hendelser = json!([{
            "type": "utbetaling",
            "hendelsestidspunkt": "2024-03-01T12:00:00.000Z",
            "utbetalingsreferanse": "U1",
            "status": "UTBETALT",
            "belop": 1500.0,
            "utbetalingsdato": "2024-03-01",
            "annenMottaker": false
        }]);
        let state = test_state(
            vec![sak(sak_json(SENDT))],
            dokumenter(hendelser),
            Gradering::Ugradert,
        );
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .service(
                    web::scope("/api/v1/innsyn")
                        .service(hent_utbetalinger)
                        .service(hent_nye_utbetalinger)
                        .service(hent_tidligere_utbetalinger),
                )
                .service(web::scope("/api/v2/innsyn/utbetalinger").service(hent_utbetalinger_v2)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer())
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[rstest]
    #[case::default_window("/api/v1/innsyn/utbetalinger")]
    #[case::explicit_window("/api/v1/innsyn/utbetalinger?month=6")]
    #[case::tidligere("/api/v1/innsyn/utbetalinger/tidligere")]
    #[actix_web::test]
    async fn paid_utbetaling_is_grouped_under_mars(#[case] uri: &str) {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["maned"], "mars");
        assert_eq!(body[0]["utbetalinger"][0]["belop"], 1500.0);
    }

    #[actix_web::test]
    async fn nye_is_empty_without_planned_utbetalinger() {
        let (status, body) = get("/api/v1/innsyn/utbetalinger/nye").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn v2_lists_flat_utbetalinger() {
        let (status, body) = get("/api/v2/innsyn/utbetalinger").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["referanse"], "U1");
        assert_eq!(body[0]["fiksDigisosId"], "123");
    }

    #[rstest]
    fn month_defaults_to_three() {
        let query: MonthQuery = serde_json::from_value(json!({})).expect("query");
        assert_eq!(query.month, 3);
    }
}
