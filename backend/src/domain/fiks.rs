//! Access to digisos saker and documents on behalf of the logged-in user.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::digisos::DigisosSak;
use super::ports::{CachePolicy, Ettersending, FiksClient, FiksClientError};
use super::support::mask_fnr;
use super::{AuthenticatedUser, Error, TilgangService};

/// Wraps the Fiks port with user verification and error mapping.
#[derive(Clone)]
pub struct FiksService {
    fiks: Arc<dyn FiksClient>,
    tilgang: TilgangService,
}

impl FiksService {
    pub fn new(fiks: Arc<dyn FiksClient>, tilgang: TilgangService) -> Self {
        Self { fiks, tilgang }
    }

    /// Fetch a sak and check that it belongs to the user.
    pub async fn hent_digisos_sak(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
        cache: CachePolicy,
    ) -> Result<DigisosSak, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user.token(), cache)
            .await
            .map_err(|err| map_fiks_error("hentDigisosSak", err))?;
        self.tilgang
            .verify_digisos_sak_is_for_correct_user(&sak, user)
            .await?;
        Ok(sak)
    }

    /// Fetch every sak of the user.
    pub async fn hent_alle_digisos_saker(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<DigisosSak>, Error> {
        let saker = self
            .fiks
            .hent_alle_digisos_saker(user.token())
            .await
            .map_err(|err| map_fiks_error("hentAlleDigisosSaker", err))?;
        self.tilgang
            .verify_digisos_saker_are_for_correct_user(&saker, user)
            .await?;
        Ok(saker)
    }

    /// Fetch and decode a JSON document from the dokumentlager.
    pub async fn hent_dokument<T: DeserializeOwned>(
        &self,
        fiks_digisos_id: &str,
        dokumentlager_id: &str,
        versjon: Option<i64>,
        user: &AuthenticatedUser,
    ) -> Result<T, Error> {
        let bytes = self
            .fiks
            .hent_dokument(fiks_digisos_id, dokumentlager_id, versjon, user.token())
            .await
            .map_err(|err| map_fiks_error("hentDokument", err))?;
        let dokument = serde_json::from_slice(&bytes).map_err(|err| {
            error!(
                dokumentlager_id,
                error = %err,
                "dokument fra Fiks kunne ikke deserialiseres"
            );
            Error::fiks("Kunne ikke lese dokument fra Fiks")
        })?;
        debug!(dokumentlager_id, "hentet dokument fra Fiks");
        Ok(dokument)
    }

    /// Post an ettersendelse. The sak must already be verified.
    pub async fn last_opp_ettersendelse(
        &self,
        ettersending: Ettersending,
        user: &AuthenticatedUser,
    ) -> Result<(), Error> {
        self.fiks
            .last_opp_nye_ettersendte_vedlegg(ettersending, user.token())
            .await
            .map_err(|err| map_fiks_error("lastOppNyEttersendelse", err))
    }
}

/// Translate a port error into a frontend-safe domain error.
pub(crate) fn map_fiks_error(operation: &str, err: FiksClientError) -> Error {
    let detail = mask_fnr(&err.to_string());
    match err {
        FiksClientError::NotFound { .. } => {
            warn!(operation, detail, "Fiks fant ikke ressursen");
            Error::fiks_not_found(format!("Fiks - {operation} feilet"))
        }
        FiksClientError::Unauthorized { .. } => {
            warn!(operation, detail, "Fiks avviste token");
            Error::token_expired()
        }
        FiksClientError::Client { .. }
        | FiksClientError::Server { .. }
        | FiksClientError::Transport { .. }
        | FiksClientError::Decode { .. } => {
            error!(operation, detail, "kall mot Fiks feilet");
            Error::fiks(format!("Fiks - {operation} feilet"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::Token;
    use crate::domain::digisos::JsonSoknad;
    use crate::domain::ports::{MockFiksClient, MockPdlClient};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    const FNR: &str = "12345678910";

    #[fixture]
    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(FNR, Token::new("token"))
    }

    fn sak(soker_fnr: &str) -> DigisosSak {
        serde_json::from_value(serde_json::json!({
            "fiksDigisosId": "123",
            "sokerFnr": soker_fnr,
            "fiksOrgId": "org",
            "kommunenummer": "0301",
            "sistEndret": 0
        }))
        .expect("valid sak")
    }

    fn tilgang_with_identer(identer: Vec<&'static str>) -> TilgangService {
        let mut pdl = MockPdlClient::new();
        pdl.expect_hent_identer().returning(move |_, _| {
            Ok(identer.iter().map(|ident| (*ident).to_owned()).collect())
        });
        TilgangService::new(Arc::new(pdl))
    }

    #[rstest]
    #[tokio::test]
    async fn sak_for_other_person_is_forbidden(user: AuthenticatedUser) {
        let mut fiks = MockFiksClient::new();
        fiks.expect_hent_digisos_sak()
            .with(eq("123"), mockall::predicate::always(), eq(CachePolicy::UseCache))
            .return_once(|_, _, _| Ok(sak("10987654321")));
        let service = FiksService::new(Arc::new(fiks), tilgang_with_identer(vec![FNR]));

        let err = service
            .hent_digisos_sak("123", &user, CachePolicy::UseCache)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::TilgangError);
    }

    #[rstest]
    #[case::not_found(FiksClientError::not_found("borte"), ErrorCode::FiksNotFound)]
    #[case::unauthorized(FiksClientError::unauthorized("utløpt"), ErrorCode::TokenExpired)]
    #[case::server(FiksClientError::server(502_u16, "bad gateway"), ErrorCode::FiksError)]
    #[case::transport(FiksClientError::transport("reset"), ErrorCode::FiksError)]
    #[tokio::test]
    async fn port_errors_are_mapped(
        user: AuthenticatedUser,
        #[case] port_error: FiksClientError,
        #[case] expected: ErrorCode,
    ) {
        let mut fiks = MockFiksClient::new();
        fiks.expect_hent_digisos_sak()
            .return_once(move |_, _, _| Err(port_error));
        let service = FiksService::new(Arc::new(fiks), tilgang_with_identer(vec![FNR]));

        let err = service
            .hent_digisos_sak("123", &user, CachePolicy::Bypass)
            .await
            .expect_err("mapped error");
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn documents_are_decoded_into_the_requested_type(user: AuthenticatedUser) {
        let mut fiks = MockFiksClient::new();
        fiks.expect_hent_dokument()
            .with(eq("123"), eq("meta"), eq(None), mockall::predicate::always())
            .return_once(|_, _, _, _| {
                Ok(br#"{"mottaker":{"enhetsnummer":"0301","navEnhetsnavn":"NAV Oslo"}}"#.to_vec())
            });
        let service = FiksService::new(Arc::new(fiks), tilgang_with_identer(vec![FNR]));

        let soknad: JsonSoknad = service
            .hent_dokument("123", "meta", None, &user)
            .await
            .expect("decoded");
        assert_eq!(
            soknad.mottaker.and_then(|m| m.nav_enhetsnavn).as_deref(),
            Some("NAV Oslo")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn undecodable_document_is_a_fiks_error(user: AuthenticatedUser) {
        let mut fiks = MockFiksClient::new();
        fiks.expect_hent_dokument()
            .return_once(|_, _, _, _| Ok(b"ikke json".to_vec()));
        let service = FiksService::new(Arc::new(fiks), tilgang_with_identer(vec![FNR]));

        let err = service
            .hent_dokument::<JsonSoknad>("123", "meta", None, &user)
            .await
            .expect_err("decode failure");
        assert_eq!(err.code(), ErrorCode::FiksError);
    }
}
