//! Access control based on PDL confidentiality codes.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::digisos::DigisosSak;
use super::ports::{PdlClient, PdlPerson};
use super::{AuthenticatedUser, Error};

/// Answer for `/tilgang`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tilgang {
    pub har_tilgang: bool,
    pub fornavn: String,
}

/// Decides whether a citizen may see innsyn data.
#[derive(Clone)]
pub struct TilgangService {
    pdl: Arc<dyn PdlClient>,
}

impl TilgangService {
    pub fn new(pdl: Arc<dyn PdlClient>) -> Self {
        Self { pdl }
    }

    /// Reject users with kode 6 or kode 7.
    ///
    /// A failing PDL lookup lets the request through.
    pub async fn sjekk_tilgang(&self, user: &AuthenticatedUser) -> Result<(), Error> {
        match self.hent_person(user).await {
            Some(person) if person.is_kode6_or_7() => {
                Err(Error::tilgang("Bruker har ikke tilgang til innsyn"))
            }
            _ => Ok(()),
        }
    }

    /// Access flag and capitalised first name for the frontend.
    pub async fn hent_tilgang(&self, user: &AuthenticatedUser) -> Tilgang {
        let Some(person) = self.hent_person(user).await else {
            return Tilgang {
                har_tilgang: false,
                fornavn: String::new(),
            };
        };
        Tilgang {
            har_tilgang: !person.is_kode6_or_7(),
            fornavn: fornavn(&person),
        }
    }

    /// Ensure the sak belongs to one of the user's identer.
    pub async fn verify_digisos_sak_is_for_correct_user(
        &self,
        sak: &DigisosSak,
        user: &AuthenticatedUser,
    ) -> Result<(), Error> {
        self.verify_digisos_saker_are_for_correct_user(std::slice::from_ref(sak), user)
            .await
    }

    /// Like [`Self::verify_digisos_sak_is_for_correct_user`] with one PDL lookup.
    pub async fn verify_digisos_saker_are_for_correct_user(
        &self,
        saker: &[DigisosSak],
        user: &AuthenticatedUser,
    ) -> Result<(), Error> {
        if saker.is_empty() {
            return Ok(());
        }
        let identer = self
            .pdl
            .hent_identer(user.ident(), user.token())
            .await
            .map_err(|err| {
                warn!(error = %err, "henting av identer fra pdl feilet");
                Error::pdl("Kunne ikke hente identer")
            })?;
        if saker
            .iter()
            .all(|sak| identer.iter().any(|ident| ident == &sak.soker_fnr))
        {
            Ok(())
        } else {
            Err(Error::tilgang("digisosSak hører ikke til rett person"))
        }
    }

    async fn hent_person(&self, user: &AuthenticatedUser) -> Option<PdlPerson> {
        match self.pdl.hent_person(user.ident(), user.token()).await {
            Ok(person) => person,
            Err(err) => {
                warn!(error = %err, "PDL kaster feil -> midlertidig ikke tilgang");
                None
            }
        }
    }
}

fn fornavn(person: &PdlPerson) -> String {
    let navn = person.fornavn().map(capitalise).unwrap_or_default();
    if navn.is_empty() {
        warn!("PDL har ingen fornavn på brukeren");
    }
    navn
}

fn capitalise(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
