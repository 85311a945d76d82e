//! Driven port for person data in PDL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;
use crate::domain::Token;

/// Confidentiality level registered on a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gradering {
    /// Kode 6 abroad.
    StrengtFortroligUtland,
    /// Kode 6.
    StrengtFortrolig,
    /// Kode 7.
    Fortrolig,
    Ugradert,
}

impl Gradering {
    /// True for kode 6 and kode 7.
    pub fn is_fortrolig(self) -> bool {
        !matches!(self, Self::Ugradert)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adressebeskyttelse {
    pub gradering: Gradering,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdlNavn {
    #[serde(default)]
    pub fornavn: Option<String>,
    #[serde(default)]
    pub mellomnavn: Option<String>,
    #[serde(default)]
    pub etternavn: Option<String>,
}

/// The parts of `hentPerson` used for access control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdlPerson {
    #[serde(default)]
    pub adressebeskyttelse: Vec<Adressebeskyttelse>,
    #[serde(default)]
    pub navn: Vec<PdlNavn>,
}

impl PdlPerson {
    /// True when any registered gradering is kode 6 or kode 7.
    pub fn is_kode6_or_7(&self) -> bool {
        self.adressebeskyttelse
            .iter()
            .any(|beskyttelse| beskyttelse.gradering.is_fortrolig())
    }

    /// First registered fornavn, if any.
    pub fn fornavn(&self) -> Option<&str> {
        self.navn.iter().find_map(|navn| navn.fornavn.as_deref())
    }
}

define_port_error! {
    /// Errors surfaced while calling PDL.
    pub enum PdlClientError {
        /// PDL answered with an error status.
        Status { status: u16, message: String } => "pdl svarte {status}: {message}",
        /// PDL answered 200 with GraphQL errors.
        GraphQl { message: String } => "feil i respons fra pdl: {message}",
        /// The request never produced a response.
        Transport { message: String } => "pdl transportfeil: {message}",
        /// Token exchange towards PDL failed.
        Token { message: String } => "token mot pdl feilet: {message}",
    }
}

/// Port for looking up one person.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdlClient: Send + Sync {
    /// Fetch confidentiality and names. `None` when PDL has no person.
    async fn hent_person(
        &self,
        ident: &str,
        token: &Token,
    ) -> Result<Option<PdlPerson>, PdlClientError>;

    /// Fetch every ident, historic ones included, belonging to the person.
    async fn hent_identer(&self, ident: &str, token: &Token) -> Result<Vec<String>, PdlClientError>;
}
