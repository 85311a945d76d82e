//! `GET /api/v1/innsyn/tilgang`.

use actix_web::{get, web};

use crate::domain::Tilgang;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::state::HttpState;

/// Whether the user may use innsyn, with their first name for greeting.
///
/// Never answers `403`; users with kode 6 or 7 get `harTilgang: false`.
#[utoipa::path(
    get,
    path = "/api/v1/innsyn/tilgang",
    responses(
        (status = 200, description = "Tilgang", body = Tilgang),
        (status = 401, description = "Missing or invalid token")
    ),
    tags = ["tilgang"],
    operation_id = "harTilgang"
)]
#[get("/tilgang")]
pub async fn har_tilgang(
    state: web::Data<HttpState>,
    user: BearerUser,
) -> ApiResult<web::Json<Tilgang>> {
    Ok(web::Json(state.tilgang.hent_tilgang(&user).await))
}
