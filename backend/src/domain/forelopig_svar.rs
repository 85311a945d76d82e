//! Whether the kommune has sent a foreløpig svar.

use serde::Serialize;
use utoipa::ToSchema;

use super::ports::CachePolicy;
use super::{AuthenticatedUser, Error, EventService, FiksService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForelopigSvarResponse {
    pub har_mottatt_forelopig_svar: bool,
    pub link: Option<String>,
}

#[derive(Clone)]
pub struct ForelopigSvarService {
    fiks: FiksService,
    event: EventService,
}

impl ForelopigSvarService {
    pub fn new(fiks: FiksService, event: EventService) -> Self {
        Self { fiks, event }
    }

    pub async fn hent_forelopig_svar(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<ForelopigSvarResponse, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_model(&sak, user).await?;
        Ok(ForelopigSvarResponse {
            har_mottatt_forelopig_svar: model.forelopig_svar.har_mottatt_forelopig_svar,
            link: model.forelopig_svar.link,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::test_fixtures::{
        clock_at, dokumenter, event_service, fiks_client, fiks_service, sak, sak_json, user,
    };

    const SENDT: i64 = 1_709_287_200_000;

    async fn svar(hendelser: serde_json::Value) -> ForelopigSvarResponse {
        let saker = vec![sak(sak_json(SENDT))];
        let dokumenter = dokumenter(hendelser);
        let service = ForelopigSvarService::new(
            fiks_service(fiks_client(saker.clone(), dokumenter.clone())),
            event_service(saker, dokumenter, clock_at(2024, 3, 10)),
        );
        service
            .hent_forelopig_svar("123", &user())
            .await
            .expect("foreløpig svar")
    }

    #[rstest]
    #[tokio::test]
    async fn link_to_the_letter_is_returned() {
        let response = svar(json!([{
            "type": "forelopigSvar",
            "hendelsestidspunkt": "2024-03-02T10:00:00.000Z",
            "forvaltningsbrev": { "referanse": { "type": "dokumentlager", "id": "brev-1" } }
        }]))
        .await;

        assert!(response.har_mottatt_forelopig_svar);
        assert_eq!(
            response.link.as_deref(),
            Some("https://dokumentlager/dokumentlager/nedlasting/niva4/brev-1?inline=true")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn no_forelopig_svar_without_hendelse() {
        let response = svar(json!([])).await;
        assert_eq!(
            response,
            ForelopigSvarResponse {
                har_mottatt_forelopig_svar: false,
                link: None,
            }
        );
    }
}
