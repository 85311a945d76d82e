//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers take a [`BearerUser`] argument; the extractor introspects the
//! `Authorization` header through Texas and yields the citizen behind it.

use std::ops::Deref;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::domain::ports::{TokenIntrospection, TokenIntrospector};
use crate::domain::{AuthenticatedUser, Error, Token};

use super::state::HttpState;

/// Authentication assurance levels accepted for innsyn.
pub const ACCEPTED_ACR: [&str; 2] = ["idporten-loa-high", "Level4"];

/// Citizen authenticated by a valid ID-porten bearer token.
#[derive(Debug, Clone)]
pub struct BearerUser(AuthenticatedUser);

impl BearerUser {
    pub fn into_inner(self) -> AuthenticatedUser {
        self.0
    }
}

impl Deref for BearerUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn read_token(req: &HttpRequest) -> Option<Token> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(Token::from_authorization)
        .filter(|token| !token.as_str().is_empty())
}

/// The `pid` of an active, error-free, high-assurance token.
fn accepted_ident(introspection: TokenIntrospection) -> Option<String> {
    if !introspection.active {
        debug!("token er ikke aktivt");
        return None;
    }
    if let Some(error) = introspection.error.as_deref() {
        debug!(error, "introspeksjon returnerte feil");
        return None;
    }
    let acr_ok = introspection
        .acr
        .as_deref()
        .is_some_and(|acr| ACCEPTED_ACR.contains(&acr));
    if !acr_ok {
        debug!(acr = ?introspection.acr, "token har feil acr");
        return None;
    }
    introspection.pid.filter(|pid| !pid.is_empty())
}

/// Validate `token` and build the user behind it.
///
/// # Errors
///
/// Returns [`crate::domain::ErrorCode::Unauthorized`] for missing, inactive
/// or low-assurance tokens, and when Texas cannot be reached.
pub async fn authenticate(
    introspector: &dyn TokenIntrospector,
    token: Option<Token>,
) -> Result<AuthenticatedUser, Error> {
    let token = token.ok_or_else(|| Error::unauthorized("Mangler bearer token"))?;
    let introspection = introspector.introspect(&token).await.map_err(|err| {
        warn!(error = %err, "tokenintrospeksjon feilet");
        Error::unauthorized("Kunne ikke validere token")
    })?;
    let ident = accepted_ident(introspection)
        .ok_or_else(|| Error::unauthorized("Ugyldig token"))?;
    Ok(AuthenticatedUser::new(ident, token))
}

impl FromRequest for BearerUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = read_token(req);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::unexpected("HttpState er ikke registrert"))?;
            authenticate(state.introspector.as_ref(), token)
                .await
                .map(BearerUser)
                .map_err(|err| match state.login_url.as_deref() {
                    Some(url) => err.with_login_url(url),
                    None => err,
                })
        })
    }
}
