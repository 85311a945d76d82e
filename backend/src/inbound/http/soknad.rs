//! Read endpoints for one søknad.
//!
//! ```text
//! GET /api/v1/innsyn/{fiksDigisosId}/soknadsStatus
//! GET /api/v1/innsyn/{fiksDigisosId}/saksStatus
//! GET /api/v1/innsyn/{fiksDigisosId}/hendelser
//! GET /api/v1/innsyn/{fiksDigisosId}/hendelser/beta
//! GET /api/v1/innsyn/{fiksDigisosId}/forelopigSvar
//! GET /api/v1/innsyn/{fiksDigisosId}/kommune
//! ```

use actix_web::{HttpResponse, get, web};

use crate::domain::hendelse::{HendelseDto, HendelseResponse};
use crate::domain::saks_status::SaksStatusResponse;
use crate::domain::soknads_status::SoknadsStatusResponse;
use crate::domain::{ForelopigSvarResponse, KommuneResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::error::FrontendErrorMessage;
use crate::inbound::http::json_or_no_content;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/soknadsStatus",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Søknadsstatus", body = SoknadsStatusResponse),
        (status = 404, description = "Unknown sak", body = FrontendErrorMessage)
    ),
    tags = ["soknad"],
    operation_id = "hentSoknadsStatus"
)]
#[get("/{fiks_digisos_id}/soknadsStatus")]
pub async fn hent_soknads_status(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<SoknadsStatusResponse>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let status = state
        .soknads_status
        .hent_soknads_status(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(status))
}

/// Saker of the søknad; `204` when there are none.
#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/saksStatus",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Saker", body = [SaksStatusResponse]),
        (status = 204, description = "No saker")
    ),
    tags = ["soknad"],
    operation_id = "hentSaksStatuser"
)]
#[get("/{fiks_digisos_id}/saksStatus")]
pub async fn hent_saks_statuser(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let saker = state
        .saks_status
        .hent_saks_statuser(&path.into_inner(), &user)
        .await?;
    Ok(json_or_no_content(&saker))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/hendelser",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "Historikk", body = [HendelseResponse])),
    tags = ["soknad"],
    operation_id = "hentHendelser"
)]
#[get("/{fiks_digisos_id}/hendelser")]
pub async fn hent_hendelser(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<HendelseResponse>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let hendelser = state
        .hendelse
        .hent_hendelser(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(hendelser))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/hendelser/beta",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "Typed historikk", body = [HendelseDto])),
    tags = ["soknad"],
    operation_id = "hentHendelserBeta"
)]
#[get("/{fiks_digisos_id}/hendelser/beta")]
pub async fn hent_hendelser_beta(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<HendelseDto>>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let hendelser = state
        .hendelse
        .hent_hendelser_beta(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(hendelser))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/forelopigSvar",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "Foreløpig svar", body = ForelopigSvarResponse)),
    tags = ["soknad"],
    operation_id = "hentForelopigSvar"
)]
#[get("/{fiks_digisos_id}/forelopigSvar")]
pub async fn hent_forelopig_svar(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<ForelopigSvarResponse>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let svar = state
        .forelopig_svar
        .hent_forelopig_svar(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(svar))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/kommune",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "Kommune flags", body = KommuneResponse)),
    tags = ["soknad"],
    operation_id = "hentKommuneInfo"
)]
#[get("/{fiks_digisos_id}/kommune")]
pub async fn hent_kommune_info(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<KommuneResponse>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let kommune = state
        .kommune
        .hent_kommune_response(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(kommune))
}
