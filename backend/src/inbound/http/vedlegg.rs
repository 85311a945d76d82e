//! Vedlegg listing and ettersendelse upload.
//!
//! ```text
//! GET  /api/v1/innsyn/{fiksDigisosId}/vedlegg
//! POST /api/v1/innsyn/{fiksDigisosId}/vedlegg   multipart/form-data
//! ```
//!
//! The upload carries a `metadata.json` part and one part per file. Each
//! file part's filename embeds the uuid it is listed with in the metadata.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use futures_util::TryStreamExt;
use tracing::{info, warn};

use crate::domain::Error;
use crate::domain::vedlegg::{
    InnsendtFil, OppgaveOpplastingResponse, OpplastetVedleggMetadata, VedleggResponse,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerUser;
use crate::inbound::http::error::FrontendErrorMessage;
use crate::inbound::http::json_or_no_content;
use crate::inbound::http::state::HttpState;

/// Filename of the metadata part.
pub const METADATA_JSON: &str = "metadata.json";

/// Upper bound for one whole upload request.
pub const MAKS_FORSENDELSE: usize = 150 * 1024 * 1024;

#[utoipa::path(
    get,
    path = "/api/v1/innsyn/{fiksDigisosId}/vedlegg",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    responses(
        (status = 200, description = "Opplastede vedlegg", body = [VedleggResponse]),
        (status = 204, description = "No vedlegg"),
        (status = 500, description = "Dokumentlager mismatch", body = FrontendErrorMessage)
    ),
    tags = ["vedlegg"],
    operation_id = "hentVedlegg"
)]
#[get("/{fiks_digisos_id}/vedlegg")]
pub async fn hent_vedlegg(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state.tilgang.sjekk_tilgang(&user).await?;
    let vedlegg = state
        .vedlegg
        .hent_vedlegg(&path.into_inner(), &user)
        .await?;
    Ok(json_or_no_content(&vedlegg))
}

/// Validate and forward an ettersendelse to Fiks.
///
/// The response lists a status per file whether or not the upload went
/// through.
#[utoipa::path(
    post,
    path = "/api/v1/innsyn/{fiksDigisosId}/vedlegg",
    params(("fiksDigisosId" = String, Path, description = "Digisos sak id")),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "A metadata.json part followed by the files"
    ),
    responses(
        (status = 200, description = "Validation per file", body = [OppgaveOpplastingResponse]),
        (status = 400, description = "Files and metadata do not match", body = FrontendErrorMessage),
        (status = 413, description = "Possible virus", body = FrontendErrorMessage)
    ),
    tags = ["vedlegg"],
    operation_id = "sendVedlegg"
)]
#[post("/{fiks_digisos_id}/vedlegg")]
pub async fn send_vedlegg(
    state: web::Data<HttpState>,
    user: BearerUser,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<web::Json<Vec<OppgaveOpplastingResponse>>> {
    info!("forsøker å starte ettersendelse");
    state.tilgang.sjekk_tilgang(&user).await?;
    let parts = read_parts(payload).await?;
    let (metadata, filer) = split_metadata(parts)?;
    let responses = state
        .vedlegg_opplasting
        .send_vedlegg(&path.into_inner(), &metadata, &filer, &user)
        .await?;
    Ok(web::Json(responses))
}

fn multipart_error(err: actix_multipart::MultipartError) -> Error {
    warn!(error = %err, "kunne ikke lese multipart-forespørsel");
    Error::filopplasting("Kunne ikke lese opplastede filer")
}

async fn read_parts(mut payload: Multipart) -> Result<Vec<InnsendtFil>, Error> {
    let mut parts = Vec::new();
    let mut total = 0_usize;
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let filnavn = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .unwrap_or_default()
            .to_owned();
        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            total = total.saturating_add(chunk.len());
            if total > MAKS_FORSENDELSE {
                return Err(Error::filopplasting("Forsendelsen er for stor"));
            }
            data.extend_from_slice(&chunk);
        }
        parts.push(InnsendtFil { filnavn, data });
    }
    Ok(parts)
}

/// Separate the `metadata.json` part from the file parts.
fn split_metadata(
    mut parts: Vec<InnsendtFil>,
) -> Result<(Vec<OpplastetVedleggMetadata>, Vec<InnsendtFil>), Error> {
    let index = parts
        .iter()
        .position(|part| part.filnavn == METADATA_JSON)
        .ok_or_else(|| {
            warn!(antall = parts.len(), "mangler metadata.json");
            Error::filopplasting("Mangler metadata.json")
        })?;
    let metadata_part = parts.remove(index);
    let metadata = OpplastetVedleggMetadata::parse_liste(&metadata_part.data)?;
    Ok((metadata, parts))
}
