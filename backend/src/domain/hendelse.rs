//! Historikk shown on the søknad page.
//!
//! The event fold records most entries. Uploads through innsyn and
//! utbetalinger are added here since they do not come from hendelser.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::model::{
    Hendelse, HendelseTekstType, InternalDigisosSoker, UrlResponse, UtbetalingsStatus,
};
use super::ports::CachePolicy;
use super::support::unix_to_local_datetime;
use super::vedlegg::InternalVedlegg;
use super::{AuthenticatedUser, Error, EventService, FiksService, VedleggService};

/// One historikk entry as the frontend renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HendelseResponse {
    pub tidspunkt: NaiveDateTime,
    pub hendelse_type: String,
    pub url: Option<UrlResponse>,
    pub tekst_argument: Option<String>,
}

/// Typed historikk entry for the new frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum HendelseDto {
    Sendt {
        tidspunkt: NaiveDateTime,
        #[serde(rename = "navKontor")]
        nav_kontor: Option<String>,
        url: Option<String>,
    },
    Mottatt {
        tidspunkt: NaiveDateTime,
        #[serde(rename = "navKontor")]
        nav_kontor: Option<String>,
    },
    SoknadUnderBehandling {
        tidspunkt: NaiveDateTime,
        #[serde(rename = "navKontor")]
        nav_kontor: Option<String>,
    },
    SakUnderBehandling {
        tidspunkt: NaiveDateTime,
        sakstittel: Option<String>,
    },
    EtterspurtDokumentasjon {
        tidspunkt: NaiveDateTime,
        link: Option<String>,
    },
    DokumentasjonKrav {
        tidspunkt: NaiveDateTime,
        link: Option<String>,
    },
    LevertEtterspurtDokumentasjon {
        tidspunkt: NaiveDateTime,
        #[serde(rename = "antallDokumenter")]
        antall_dokumenter: u32,
    },
    SoknadFerdigBehandlet {
        tidspunkt: NaiveDateTime,
        url: Option<String>,
    },
    SakFerdigBehandlet {
        tidspunkt: NaiveDateTime,
        sakstittel: Option<String>,
        url: Option<String>,
    },
    ForelopigSvar {
        tidspunkt: NaiveDateTime,
        link: Option<String>,
    },
    BehandlesIkke {
        tidspunkt: NaiveDateTime,
    },
    Videresendt {
        tidspunkt: NaiveDateTime,
        #[serde(rename = "navKontor")]
        nav_kontor: Option<String>,
        papirsoknad: bool,
    },
    SoknadKanIkkeViseStatus {
        tidspunkt: NaiveDateTime,
        soknadstittel: Option<String>,
    },
    SakKanIkkeViseStatus {
        tidspunkt: NaiveDateTime,
        sakstittel: Option<String>,
    },
    UtbetalingerOppdatert {
        tidspunkt: NaiveDateTime,
    },
}

impl HendelseDto {
    /// Typed form of a historikk entry; link texts and vilkår have none.
    pub fn from_hendelse(hendelse: &Hendelse, enhet_navn: Option<&str>) -> Option<Self> {
        use HendelseTekstType as T;

        let tidspunkt = hendelse.tidspunkt;
        let link = hendelse.url.as_ref().map(|url| url.link.clone());
        let tekst = hendelse.tekst_argument.clone();
        let nav_kontor = enhet_navn.map(str::to_owned);
        let dto = match hendelse.hendelse_type {
            T::SoknadSendTilKontor => Self::Sendt {
                tidspunkt,
                nav_kontor,
                url: link,
            },
            T::SoknadUnderBehandling => Self::SoknadUnderBehandling {
                tidspunkt,
                nav_kontor,
            },
            T::SoknadMottattMedKommunenavn | T::SoknadMottattUtenKommunenavn => Self::Mottatt {
                tidspunkt,
                nav_kontor,
            },
            T::SoknadFerdigbehandlet => Self::SoknadFerdigBehandlet {
                tidspunkt,
                url: link,
            },
            T::SoknadBehandlesIkke => Self::BehandlesIkke { tidspunkt },
            T::SoknadVideresendtPapirsoknadMedNorgEnhet
            | T::SoknadVideresendtPapirsoknadUtenNorgEnhet => Self::Videresendt {
                tidspunkt,
                nav_kontor: tekst,
                papirsoknad: true,
            },
            T::SoknadVideresendtMedNorgEnhet | T::SoknadVideresendtUtenNorgEnhet => {
                Self::Videresendt {
                    tidspunkt,
                    nav_kontor: tekst,
                    papirsoknad: false,
                }
            }
            T::SoknadKanIkkeViseStatusMedTittel | T::SoknadKanIkkeViseStatusUtenTittel => {
                Self::SoknadKanIkkeViseStatus {
                    tidspunkt,
                    soknadstittel: tekst,
                }
            }
            T::SakUnderBehandlingMedTittel | T::SakUnderBehandlingUtenTittel => {
                Self::SakUnderBehandling {
                    tidspunkt,
                    sakstittel: tekst,
                }
            }
            T::SakFerdigbehandletMedTittel | T::SakFerdigbehandletUtenTittel => {
                Self::SakFerdigBehandlet {
                    tidspunkt,
                    sakstittel: tekst,
                    url: link,
                }
            }
            T::SakKanIkkeViseStatusMedTittel | T::SakKanIkkeViseStatusUtenTittel => {
                Self::SakKanIkkeViseStatus {
                    tidspunkt,
                    sakstittel: tekst,
                }
            }
            T::AntallSendteVedlegg => Self::LevertEtterspurtDokumentasjon {
                tidspunkt,
                antall_dokumenter: tekst.and_then(|antall| antall.parse().ok()).unwrap_or(0),
            },
            T::UtbetalingerOppdatert => Self::UtbetalingerOppdatert { tidspunkt },
            T::BrevOmSaksbehandlingstid => Self::ForelopigSvar { tidspunkt, link },
            T::EttersporMerDokumentasjon => Self::EtterspurtDokumentasjon { tidspunkt, link },
            T::EttersporIkkeMerDokumentasjon => Self::LevertEtterspurtDokumentasjon {
                tidspunkt,
                antall_dokumenter: 0,
            },
            T::Dokumentasjonkrav => Self::DokumentasjonKrav { tidspunkt, link },
            T::VilkarOppdatert | T::VisBrevetLenketekst | T::SoknadSendTilKontorLenketekst => {
                return None;
            }
        };
        Some(dto)
    }
}

#[derive(Clone)]
pub struct HendelseService {
    fiks: FiksService,
    event: EventService,
    vedlegg: VedleggService,
}

impl HendelseService {
    pub fn new(fiks: FiksService, event: EventService, vedlegg: VedleggService) -> Self {
        Self {
            fiks,
            event,
            vedlegg,
        }
    }

    pub async fn hent_hendelser(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<HendelseResponse>, Error> {
        let (historikk, _) = self.hent_historikk(fiks_digisos_id, user).await?;
        let responses: Vec<HendelseResponse> = historikk
            .iter()
            .map(|hendelse| HendelseResponse {
                tidspunkt: hendelse.tidspunkt,
                hendelse_type: hendelse.hendelse_type.name().to_owned(),
                url: hendelse.url.clone(),
                tekst_argument: hendelse.tekst_argument.clone(),
            })
            .collect();
        info!(antall = responses.len(), "hentet historikk");
        Ok(responses)
    }

    pub async fn hent_hendelser_beta(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<Vec<HendelseDto>, Error> {
        let (historikk, model) = self.hent_historikk(fiks_digisos_id, user).await?;
        let enhet_navn = model
            .soknadsmottaker
            .as_ref()
            .and_then(|mottaker| mottaker.nav_enhetsnavn.as_deref());
        Ok(historikk
            .iter()
            .filter_map(|hendelse| HendelseDto::from_hendelse(hendelse, enhet_navn))
            .collect())
    }

    async fn hent_historikk(
        &self,
        fiks_digisos_id: &str,
        user: &AuthenticatedUser,
    ) -> Result<(Vec<Hendelse>, InternalDigisosSoker), Error> {
        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::UseCache)
            .await?;
        let mut model = self.event.create_model(&sak, user).await?;
        let vedlegg = self
            .vedlegg
            .hent_ettersendte_vedlegg(&sak, &model, user)
            .await?;

        if let Some(sendt) = sak
            .original_soknad_nav
            .as_ref()
            .and_then(|original| unix_to_local_datetime(original.timestamp_sendt))
        {
            model.legg_til_hendelser_for_opplastinger(sendt, &vedlegg);
        }
        model.legg_til_hendelser_for_utbetalinger();

        let mut historikk = model.historikk.clone();
        historikk.sort_by_key(|hendelse| hendelse.tidspunkt);
        Ok((historikk, model))
    }
}

impl InternalDigisosSoker {
    /// One entry per upload time, counting the files uploaded then.
    fn legg_til_hendelser_for_opplastinger(
        &mut self,
        soknad_sendt: NaiveDateTime,
        vedlegg: &[InternalVedlegg],
    ) {
        let mut grupper: Vec<(NaiveDateTime, usize)> = Vec::new();
        for opplastet in vedlegg.iter().filter(|v| {
            v.tidspunkt_lastet_opp > soknad_sendt && !v.dokument_info_list.is_empty()
        }) {
            let antall = opplastet.dokument_info_list.len();
            match grupper
                .iter_mut()
                .find(|(tidspunkt, _)| *tidspunkt == opplastet.tidspunkt_lastet_opp)
            {
                Some((_, sum)) => *sum += antall,
                None => grupper.push((opplastet.tidspunkt_lastet_opp, antall)),
            }
        }
        self.historikk
            .extend(grupper.into_iter().map(|(tidspunkt, antall)| {
                Hendelse::new(HendelseTekstType::AntallSendteVedlegg, tidspunkt)
                    .with_tekst_argument(Some(antall.to_string()))
            }));
    }

    /// One entry per five-minute window with utbetaling changes.
    fn legg_til_hendelser_for_utbetalinger(&mut self) {
        let mut vinduer: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
        for utbetaling in self
            .utbetalinger
            .iter()
            .filter(|utbetaling| utbetaling.status != UtbetalingsStatus::Annullert)
        {
            let vindu = rund_ned_til_naermeste_5_minutt(utbetaling.dato_hendelse);
            if !vinduer.iter().any(|(eksisterende, _)| *eksisterende == vindu) {
                vinduer.push((vindu, utbetaling.dato_hendelse));
            }
        }
        self.historikk.extend(vinduer.into_iter().map(|(_, forste)| {
            Hendelse::new(HendelseTekstType::UtbetalingerOppdatert, forste)
        }));
    }
}

fn rund_ned_til_naermeste_5_minutt(tidspunkt: NaiveDateTime) -> NaiveDateTime {
    let minutt = tidspunkt.minute() - tidspunkt.minute() % 5;
    tidspunkt
        .with_minute(minutt)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(tidspunkt)
}
