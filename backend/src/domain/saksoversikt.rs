//! Overview of every søknad of the user and the summary card of one søknad.

use std::sync::Arc;

use chrono::{Duration, Months, NaiveDateTime};
use mockable::Clock;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::model::{DEFAULT_SAK_TITTEL, InternalDigisosSoker, SoknadsStatus, UtbetalingsStatus};
use super::oppgave::{dokumentasjonkrav, oppgaver, vilkar};
use super::digisos::DigisosSak;
use super::ports::CachePolicy;
use super::support::{now_local, unix_to_local_datetime};
use super::{
    AuthenticatedUser, Error, ErrorCode, EventService, FiksService, KommuneService, OppgaveService,
    VedleggService,
};

/// Source marker the frontend uses to tell innsyn saker apart.
pub const KILDE_INNSYN_API: &str = "innsyn-api";

/// Translation key of the generic søknad tittel.
const SAKER_DEFAULT_TITTEL: &str = "saker.default_tittel";

/// Vilkår and dokumentasjonkrav stop counting this long after the last
/// utbetaling period ended.
const DAGER_ETTER_UTBETALINGSPERIODE: i64 = 21;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaksListeResponse {
    pub fiks_digisos_id: String,
    pub soknad_tittel: String,
    pub sist_oppdatert: NaiveDateTime,
    pub kilde: String,
    pub kommunenummer: String,
    pub is_broken_soknad: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaksDetaljerResponse {
    pub fiks_digisos_id: String,
    pub soknad_tittel: String,
    pub status: SoknadsStatus,
    pub antall_nye_oppgaver: usize,
    pub dokumentasjon_etterspurt: bool,
    pub vilkar: bool,
    pub dokumentasjonkrav: bool,
}

/// What the fagsystem of the newest sak offers for papirsøknader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PapirsoknadInnsyn {
    /// The newest sak is a papirsøknad that is MOTTATT with innsyn.
    Aktivert,
    /// The fagsystem version supports it, but the sak is not a papirsøknad.
    Stottet,
}

#[derive(Clone)]
pub struct SaksoversiktService {
    fiks: FiksService,
    event: EventService,
    vedlegg: VedleggService,
    kommune: KommuneService,
    clock: Arc<dyn Clock>,
    papirsoknad_oppgave: Option<OppgaveService>,
}

impl SaksoversiktService {
    pub fn new(
        fiks: FiksService,
        event: EventService,
        vedlegg: VedleggService,
        kommune: KommuneService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fiks,
            event,
            vedlegg,
            kommune,
            clock,
            papirsoknad_oppgave: None,
        }
    }

    /// Log, on every saksoversikt, whether the kommune offers innsyn in
    /// papirsøknader.
    #[must_use]
    pub fn with_papirsoknad_logging(mut self, oppgave: OppgaveService) -> Self {
        self.papirsoknad_oppgave = Some(oppgave);
        self
    }

    /// True when a sak changed during the last year belongs to a kommune
    /// with innsyn.
    pub async fn har_soknader_med_innsyn(&self, user: &AuthenticatedUser) -> Result<bool, Error> {
        let saker = self.fiks.hent_alle_digisos_saker(user).await?;
        let Some(grense) = now_local(self.clock.as_ref()).checked_sub_months(Months::new(12)) else {
            return Ok(false);
        };
        for sak in saker
            .iter()
            .filter(|sak| unix_to_local_datetime(sak.sist_endret).is_some_and(|endret| endret > grense))
        {
            if !self.kommune.er_innsyn_deaktivert_for_kommune(sak).await? {
                return Ok(true);
            }
        }
        info!(antall = saker.len(), "ingen søknader med innsyn siste 12 måneder");
        Ok(false)
    }

    /// Every søknad with content, most recently changed first.
    pub async fn hent_alle_saker(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<SaksListeResponse>, Error> {
        let saker = self
            .fiks
            .hent_alle_digisos_saker(user)
            .await
            .map_err(|err| match err.code() {
                ErrorCode::TilgangError | ErrorCode::TokenExpired => err,
                _ => Error::service_unavailable("Kunne ikke hente saker fra Fiks"),
            })?;

        match self.papirsoknad_innsyn(&saker, user).await? {
            Some(PapirsoknadInnsyn::Aktivert) => info!(
                kommunenummer = saker.first().map(|sak| sak.kommunenummer.as_str()),
                "kommunen har aktivert innsyn i papirsøknader"
            ),
            Some(PapirsoknadInnsyn::Stottet) => info!(
                kommunenummer = saker.first().map(|sak| sak.kommunenummer.as_str()),
                "kommunen har fagsystemversjon som støtter innsyn i papirsøknader"
            ),
            None => {}
        }

        let (tomme, gyldige): (Vec<_>, Vec<_>) = saker
            .into_iter()
            .partition(|sak| sak.original_soknad_nav.is_none() && sak.digisos_soker.is_none());
        info!(
            antall = tomme.len(),
            ider = ?tomme.iter().map(|sak| sak.fiks_digisos_id.as_str()).collect::<Vec<_>>(),
            "fant tomme søknader"
        );
        info!(antall = gyldige.len(), "fant gyldige søknader");

        let mut responses: Vec<SaksListeResponse> = gyldige
            .into_iter()
            .map(|sak| SaksListeResponse {
                sist_oppdatert: unix_to_local_datetime(sak.sist_endret).unwrap_or_default(),
                fiks_digisos_id: sak.fiks_digisos_id,
                soknad_tittel: SAKER_DEFAULT_TITTEL.to_owned(),
                kilde: KILDE_INNSYN_API.to_owned(),
                kommunenummer: sak.kommunenummer,
                is_broken_soknad: false,
            })
            .collect();
        responses.sort_by(|a, b| b.sist_oppdatert.cmp(&a.sist_oppdatert));
        Ok(responses)
    }

    pub async fn hent_saks_detaljer(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<SaksDetaljerResponse, Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let model = self.event.create_saksoversikt_model(&sak, user).await?;
        let ettersendte = if model.oppgaver.is_empty() && model.dokumentasjonkrav.is_empty() {
            Vec::new()
        } else {
            self.vedlegg
                .hent_ettersendte_vedlegg(&sak, &model, user)
                .await?
        };

        let antall_oppgaver = if model.status == SoknadsStatus::Ferdigbehandlet {
            0
        } else {
            oppgaver(&model, &ettersendte)
                .iter()
                .map(|oppgave| oppgave.oppgave_elementer.len())
                .sum()
        };
        let antall_vilkar = vilkar(&model).len();
        let antall_dokumentasjonkrav: usize = dokumentasjonkrav(&model, &ettersendte)
            .iter()
            .map(|krav| krav.dokumentasjonkrav_elementer.len())
            .sum();
        let antall_vilkar_og_krav = if self.alle_utbetalinger_er_avsluttet(&model) {
            0
        } else {
            antall_vilkar + antall_dokumentasjonkrav
        };

        Ok(SaksDetaljerResponse {
            fiks_digisos_id: sak.fiks_digisos_id.clone(),
            soknad_tittel: saks_navn(&model),
            status: model.status,
            antall_nye_oppgaver: antall_oppgaver + antall_vilkar_og_krav,
            dokumentasjon_etterspurt: antall_oppgaver > 0,
            vilkar: antall_vilkar > 0,
            dokumentasjonkrav: antall_dokumentasjonkrav > 0,
        })
    }

    async fn papirsoknad_innsyn(
        &self,
        saker: &[DigisosSak],
        user: &AuthenticatedUser,
    ) -> Result<Option<PapirsoknadInnsyn>, Error> {
        let (Some(oppgave), Some(forste)) = (self.papirsoknad_oppgave.as_ref(), saker.first()) else {
            return Ok(None);
        };
        if !oppgave
            .get_fagsystem_har_vilkar_og_dokumentasjonkrav(&forste.fiks_digisos_id, user)
            .await?
        {
            return Ok(None);
        }
        let aktivert = oppgave
            .sak_har_status_mottatt_og_ikke_hatt_sendt(&forste.fiks_digisos_id, user)
            .await?;
        Ok(Some(if aktivert {
            PapirsoknadInnsyn::Aktivert
        } else {
            PapirsoknadInnsyn::Stottet
        }))
    }

    /// True when every utbetaling is settled and its period ended long ago.
    fn alle_utbetalinger_er_avsluttet(&self, model: &InternalDigisosSoker) -> bool {
        let grense = now_local(self.clock.as_ref()).date() - Duration::days(DAGER_ETTER_UTBETALINGSPERIODE);
        let avsluttet = model.utbetalinger.iter().all(|utbetaling| {
            matches!(
                utbetaling.status,
                UtbetalingsStatus::Utbetalt | UtbetalingsStatus::Annullert
            ) && utbetaling.tom.is_some_and(|tom| tom < grense)
        });
        if avsluttet && !model.utbetalinger.is_empty() {
            warn!("alle utbetalinger er avsluttet, teller ikke vilkår og dokumentasjonkrav");
        }
        avsluttet && !model.utbetalinger.is_empty()
    }
}

fn saks_navn(model: &InternalDigisosSoker) -> String {
    model
        .aktive_saker()
        .map(|sak| sak.tittel.as_deref().unwrap_or(DEFAULT_SAK_TITTEL))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::digisos::DigisosSak;
    use crate::domain::ports::{FiksClientError, MockFiksClient, MockKommuneInfoClient};
    use crate::domain::test_fixtures::{
        clock_at, dokumenter, event_service, fiks_client, fiks_service, kommune_info, sak, sak_json,
        urls, user,
    };

    /// 2024-03-01T10:00:00Z
    const SENDT: i64 = 1_709_287_200_000;

    fn service_med(
        fiks: MockFiksClient,
        saker: Vec<DigisosSak>,
        dokumenter: HashMap<String, Value>,
    ) -> SaksoversiktService {
        let clock = clock_at(2024, 3, 10);
        let vedlegg = VedleggService::new(
            fiks_service(fiks_client(saker.clone(), dokumenter.clone())),
            event_service(saker.clone(), dokumenter.clone(), clock.clone()),
            urls(),
        );
        let kommune = kommune(
            fiks_service(fiks_client(saker.clone(), dokumenter.clone())),
            clock.clone(),
            true,
        );
        SaksoversiktService::new(
            fiks_service(fiks),
            event_service(saker, dokumenter, clock.clone()),
            vedlegg,
            kommune,
            clock,
        )
    }

    /// Kommune service answering `kan_oppdatere_status` for 0301 only.
    fn kommune(fiks: FiksService, clock: Arc<dyn Clock>, kan_oppdatere_status: bool) -> KommuneService {
        let mut client = MockKommuneInfoClient::new();
        client.expect_hent_kommune_info().returning(move |kommunenummer| {
            let mut info = kommune_info(kan_oppdatere_status && kommunenummer == "0301");
            info.kommunenummer = kommunenummer.to_owned();
            Ok(info)
        });
        KommuneService::new(fiks, Arc::new(client), clock)
    }

    fn oppgave_service(saker: Vec<DigisosSak>, dokumenter: HashMap<String, Value>) -> OppgaveService {
        let clock = clock_at(2024, 3, 10);
        let fiks = fiks_service(fiks_client(saker.clone(), dokumenter.clone()));
        let event = event_service(saker, dokumenter, clock);
        let vedlegg = VedleggService::new(fiks.clone(), event.clone(), urls());
        OppgaveService::new(fiks, event, vedlegg, vec!["Testsystemet;1.0.0".to_owned()])
    }

    fn service(saker: Vec<DigisosSak>, hendelser: Value) -> SaksoversiktService {
        let dokumenter = dokumenter(hendelser);
        service_med(
            fiks_client(saker.clone(), dokumenter.clone()),
            saker,
            dokumenter,
        )
    }

    fn utbetaling(referanse: &str, status: &str, tom: &str) -> Value {
        json!({
            "type": "utbetaling", "hendelsestidspunkt": "2024-03-02T10:00:00.000Z",
            "utbetalingsreferanse": referanse, "saksreferanse": "S1", "status": status,
            "utbetalingsdato": "2024-01-05", "tom": tom
        })
    }

    fn detaljer_hendelser(tom: &str) -> Value {
        json!([
            { "type": "soknadsStatus", "hendelsestidspunkt": "2024-03-02T09:00:00.000Z", "status": "UNDER_BEHANDLING" },
            { "type": "saksStatus", "hendelsestidspunkt": "2024-03-02T09:30:00.000Z", "referanse": "S1", "tittel": "Livsopphold", "status": "UNDER_BEHANDLING" },
            { "type": "dokumentasjonEtterspurt", "hendelsestidspunkt": "2024-03-02T10:00:00.000Z",
              "forvaltningsbrev": { "referanse": { "type": "dokumentlager", "id": "brev" } },
              "dokumenter": [
                { "dokumenttype": "husleie", "innsendelsesfrist": "2024-03-20T10:00:00.000Z" },
                { "dokumenttype": "strom", "innsendelsesfrist": "2024-03-20T10:00:00.000Z" }
              ] },
            utbetaling("U1", "UTBETALT", tom),
            { "type": "vilkar", "hendelsestidspunkt": "2024-03-02T10:00:00.000Z", "vilkarreferanse": "V1",
              "utbetalingsreferanse": ["U1"], "tittel": "Søk jobb", "status": "RELEVANT" },
            { "type": "dokumentasjonkrav", "hendelsestidspunkt": "2024-03-02T10:00:00.000Z",
              "dokumentasjonkravreferanse": "K1", "utbetalingsreferanse": ["U1"],
              "tittel": "Kvittering", "frist": "2024-03-25T10:00:00.000Z", "status": "RELEVANT" }
        ])
    }

    #[rstest]
    #[tokio::test]
    async fn empty_saker_are_hidden_and_the_rest_sorted() {
        let mut nyere = sak_json(SENDT + 1000);
        nyere["fiksDigisosId"] = json!("456");
        let mut tom = sak_json(SENDT + 2000);
        tom["fiksDigisosId"] = json!("789");
        tom["originalSoknadNAV"] = Value::Null;
        tom["digisosSoker"] = Value::Null;
        let service = service(vec![sak(sak_json(SENDT)), sak(nyere), sak(tom)], json!([]));

        let saker = service.hent_alle_saker(&user()).await.expect("saker");

        assert_eq!(
            saker.iter().map(|s| s.fiks_digisos_id.as_str()).collect::<Vec<_>>(),
            vec!["456", "123"]
        );
        let forste = saker.first().expect("sak");
        assert_eq!(forste.kilde, KILDE_INNSYN_API);
        assert_eq!(forste.soknad_tittel, "saker.default_tittel");
        assert_eq!(forste.kommunenummer, "0301");
        assert!(!forste.is_broken_soknad);
    }

    #[rstest]
    #[tokio::test]
    async fn fiks_failure_is_service_unavailable() {
        let dokumenter = dokumenter(json!([]));
        let mut fiks = MockFiksClient::new();
        fiks.expect_hent_alle_digisos_saker()
            .returning(|_| Err(FiksClientError::Server { status: 500, message: "nede".to_owned() }));

        let err = service_med(fiks, Vec::new(), dokumenter)
            .hent_alle_saker(&user())
            .await
            .expect_err("fiks nede");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn detaljer_count_every_open_oppgave() {
        let service = service(vec![sak(sak_json(SENDT))], detaljer_hendelser("2024-03-31"));

        let detaljer = service
            .hent_saks_detaljer("123", &user())
            .await
            .expect("detaljer");

        assert_eq!(
            detaljer,
            SaksDetaljerResponse {
                fiks_digisos_id: "123".to_owned(),
                soknad_tittel: "Livsopphold".to_owned(),
                status: SoknadsStatus::UnderBehandling,
                antall_nye_oppgaver: 4,
                dokumentasjon_etterspurt: true,
                vilkar: true,
                dokumentasjonkrav: true,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn settled_utbetalinger_stop_counting_vilkar() {
        let service = service(vec![sak(sak_json(SENDT))], detaljer_hendelser("2024-01-31"));

        let detaljer = service
            .hent_saks_detaljer("123", &user())
            .await
            .expect("detaljer");

        assert_eq!(detaljer.antall_nye_oppgaver, 2);
        assert!(detaljer.vilkar);
    }

    /// 2024-03-01T10:00:00Z minus two years.
    const ELDRE_ENN_ET_AAR: i64 = 1_646_128_800_000;

    fn sak_i_kommune(id: &str, kommunenummer: &str, sist_endret: i64) -> DigisosSak {
        let mut value = sak_json(sist_endret);
        value["fiksDigisosId"] = json!(id);
        value["kommunenummer"] = json!(kommunenummer);
        sak(value)
    }

    #[rstest]
    #[case::recent_with_innsyn(vec![("123", "4601", SENDT), ("456", "0301", SENDT)], true)]
    #[case::only_deactivated(vec![("123", "4601", SENDT)], false)]
    #[case::old_with_innsyn(vec![("123", "4601", SENDT), ("789", "0301", ELDRE_ENN_ET_AAR)], false)]
    #[case::ingen_saker(Vec::new(), false)]
    #[tokio::test]
    async fn har_soknader_med_innsyn_needs_a_recent_sak_with_innsyn(
        #[case] saker: Vec<(&str, &str, i64)>,
        #[case] expected: bool,
    ) {
        let saker: Vec<DigisosSak> = saker
            .into_iter()
            .map(|(id, kommunenummer, endret)| sak_i_kommune(id, kommunenummer, endret))
            .collect();
        let service = service(saker, json!([]));

        assert_eq!(
            service.har_soknader_med_innsyn(&user()).await.expect("svar"),
            expected
        );
    }

    #[rstest]
    #[tokio::test]
    async fn papirsoknad_innsyn_is_only_checked_when_enabled() {
        let saker = vec![sak(sak_json(SENDT))];
        let service = service(saker.clone(), json!([]));

        let innsyn = service
            .papirsoknad_innsyn(&saker, &user())
            .await
            .expect("innsyn");

        assert_eq!(innsyn, None);
    }

    #[rstest]
    #[case::papirsoknad(true, Some(PapirsoknadInnsyn::Aktivert))]
    #[case::digital_soknad(false, Some(PapirsoknadInnsyn::Stottet))]
    #[tokio::test]
    async fn papirsoknad_innsyn_follows_the_newest_sak(
        #[case] papir: bool,
        #[case] expected: Option<PapirsoknadInnsyn>,
    ) {
        let mut value = sak_json(SENDT);
        if papir {
            value["originalSoknadNAV"] = Value::Null;
        }
        let saker = vec![sak(value)];
        let dokumenter = dokumenter(json!([
            { "type": "soknadsStatus", "hendelsestidspunkt": "2024-03-02T10:00:00.000Z", "status": "MOTTATT" }
        ]));
        let service = service_med(
            fiks_client(saker.clone(), dokumenter.clone()),
            saker.clone(),
            dokumenter.clone(),
        )
        .with_papirsoknad_logging(oppgave_service(saker.clone(), dokumenter));

        let innsyn = service
            .papirsoknad_innsyn(&saker, &user())
            .await
            .expect("innsyn");

        assert_eq!(innsyn, expected);
        assert!(service.hent_alle_saker(&user()).await.is_ok());
    }
}
