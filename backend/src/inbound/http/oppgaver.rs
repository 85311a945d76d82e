//! Oppgaver, vilkår and dokumentasjonkrav of a søknad.
//!
//! List endpoints answer `204` when nothing is outstanding.

use actix_web::{HttpResponse, get, web};

use crate::domain::oppgave::{DokumentasjonkravResponse, OppgaveResponse, VilkarResponse};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::json_or_no_content;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/oppgaver",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Oppgaver", body = [OppgaveResponse]),
        (status = 204, description = "No oppgaver")
    ),
    tags = ["oppgaver"],
    operation_id = "hentOppgaver"
)]
#[get("/{fiks_digisos_id}/oppgaver")]
pub async fn hent_oppgaver(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let oppgaver = state
        .oppgave
        .hent_oppgaver(&path.into_inner(), &user)
        .await?;
    Ok(json_or_no_content(&oppgaver))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/oppgaver/{oppgaveId}",
    params(
        ("fiksDigisosId" = String, Path, description = "Digisos sak id"),
        ("oppgaveId" = String, Path, description = "Oppgave id")
    ),
    responses(
        (status = 200, description = "Oppgaver", body = [OppgaveResponse]),
        (status = 204, description = "No matching oppgave")
    ),
    tags = ["oppgaver"],
    operation_id = "hentOppgaveMedId"
)]
#[get("/{fiks_digisos_id}/oppgaver/{oppgave_id}")]
pub async fn hent_oppgave_med_id(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let (fiks_digisos_id, oppgave_id) = path.into_inner();
    let oppgaver = state
        .oppgave
        .hent_oppgaver_med_oppgave_id(&fiks_digisos_id, &oppgave_id, &user)
        .await?;
    Ok(json_or_no_content(&oppgaver))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/vilkar",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Vilkår", body = [VilkarResponse]),
        (status = 204, description = "No vilkår")
    ),
    tags = ["oppgaver"],
    operation_id = "hentVilkar"
)]
#[get("/{fiks_digisos_id}/vilkar")]
pub async fn hent_vilkar(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let vilkar = state.oppgave.get_vilkar(&path.into_inner(), &user).await?;
    Ok(json_or_no_content(&vilkar))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/dokumentasjonkrav",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Dokumentasjonkrav", body = [DokumentasjonkravResponse]),
        (status = 204, description = "No dokumentasjonkrav")
    ),
    tags = ["oppgaver"],
    operation_id = "hentDokumentasjonkrav"
)]
#[get("/{fiks_digisos_id}/dokumentasjonkrav")]
pub async fn hent_dokumentasjonkrav(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let krav = state
        .oppgave
        .get_dokumentasjonkrav(&path.into_inner(), &user)
        .await?;
    Ok(json_or_no_content(&krav))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/dokumentasjonkrav/{dokumentasjonkravId}",
    params(
        ("fiksDigisosId" = String, Path, description = "Digisos sak id"),
        ("dokumentasjonkravId" = String, Path, description = "Dokumentasjonkrav id")
    ),
    responses(
        (status = 200, description = "Dokumentasjonkrav", body = [DokumentasjonkravResponse]),
        (status = 204, description = "No matching dokumentasjonkrav")
    ),
    tags = ["oppgaver"],
    operation_id = "hentDokumentasjonkravMedId"
)]
#[get("/{fiks_digisos_id}/dokumentasjonkrav/{dokumentasjonkrav_id}")]
pub async fn hent_dokumentasjonkrav_med_id(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let (fiks_digisos_id, dokumentasjonkrav_id) = path.into_inner();
    let krav = state
        .oppgave
        .get_dokumentasjonkrav_med_id(&fiks_digisos_id, &dokumentasjonkrav_id, &user)
        .await?;
    Ok(json_or_no_content(&krav))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/harLeverteDokumentasjonkrav",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "True when a krav has been answered", body = bool)),
    tags = ["oppgaver"],
    operation_id = "harLevertDokumentasjonkrav"
)]
#[get("/{fiks_digisos_id}/harLeverteDokumentasjonkrav")]
pub async fn har_levert_dokumentasjonkrav(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<bool>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let levert = state
        .oppgave
        .get_har_levert_dokumentasjonkrav(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(levert))
}

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/fagsystemHarDokumentasjonkrav",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses((status = 200, description = "True when the fagsystem publishes krav", body = bool)),
    tags = ["oppgaver"],
    operation_id = "fagsystemHarDokumentasjonkrav"
)]
#[get("/{fiks_digisos_id}/fagsystemHarDokumentasjonkrav")]
pub async fn fagsystem_har_dokumentasjonkrav(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<bool>> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let stotter = state
        .oppgave
        .get_fagsystem_har_vilkar_og_dokumentasjonkrav(&path.into_inner(), &user)
        .await?;
    Ok(web::Json(stotter))
}
