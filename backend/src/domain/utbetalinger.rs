//! Utbetalinger across every sak of the user.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use futures_util::future::try_join_all;
use mockable::Clock;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::digisos::DigisosSak;
use super::model::{Utbetaling, UtbetalingsStatus};
use super::support::{norsk_maanedsnavn, now_local, unix_to_local_datetime};
use super::{AuthenticatedUser, Error, EventService, FiksService};

/// Tittel of utbetalinger without beskrivelse.
pub const UTBETALING_DEFAULT_TITTEL: &str = "Utbetaling";

/// Window used by the kommende and tidligere listings.
const KOMMENDE_OG_TIDLIGERE_MANEDER: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UtbetalingerResponse {
    pub ar: i32,
    pub maned: String,
    pub foerste_i_maneden: NaiveDate,
    pub utbetalinger: Vec<ManedUtbetaling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KommendeOgUtbetalteUtbetalingerResponse {
    pub ar: i32,
    pub maned: String,
    pub utbetalinger: Vec<ManedUtbetaling>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManedUtbetaling {
    pub tittel: String,
    pub belop: f64,
    pub utbetalingsdato: Option<NaiveDate>,
    pub forfallsdato: Option<NaiveDate>,
    pub status: UtbetalingsStatus,
    pub fiks_digisos_id: String,
    pub fom: Option<NaiveDate>,
    pub tom: Option<NaiveDate>,
    pub mottaker: Option<String>,
    pub annen_mottaker: bool,
    pub kontonummer: Option<String>,
    pub utbetalingsmetode: Option<String>,
}

/// Flat utbetaling of the v2 listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UtbetalingDto {
    pub referanse: String,
    pub tittel: String,
    pub belop: f64,
    pub utbetalingsdato: Option<NaiveDate>,
    pub forfallsdato: Option<NaiveDate>,
    pub status: UtbetalingsStatus,
    pub fiks_digisos_id: String,
    pub fom: Option<NaiveDate>,
    pub tom: Option<NaiveDate>,
    pub mottaker: Option<String>,
    pub annen_mottaker: bool,
    /// Eleven digits.
    pub kontonummer: Option<String>,
    pub utbetalingsmetode: Option<String>,
}

impl UtbetalingDto {
    fn from_utbetaling(utbetaling: &Utbetaling, fiks_digisos_id: &str) -> Self {
        Self {
            referanse: utbetaling.referanse.clone(),
            tittel: tittel(utbetaling),
            belop: utbetaling.belop,
            utbetalingsdato: utbetaling.utbetalingsdato,
            forfallsdato: utbetaling.forfallsdato,
            status: utbetaling.status,
            fiks_digisos_id: fiks_digisos_id.to_owned(),
            fom: utbetaling.fom,
            tom: utbetaling.tom,
            mottaker: utbetaling.mottaker.clone(),
            annen_mottaker: utbetaling.annen_mottaker,
            kontonummer: utbetaling.kontonummer.clone(),
            utbetalingsmetode: utbetaling.utbetalingsmetode.clone(),
        }
    }
}

#[derive(Clone)]
pub struct UtbetalingerService {
    fiks: FiksService,
    event: EventService,
    clock: Arc<dyn Clock>,
}

impl UtbetalingerService {
    pub fn new(fiks: FiksService, event: EventService, clock: Arc<dyn Clock>) -> Self {
        Self { fiks, event, clock }
    }

    /// Utbetalte utbetalinger of saker changed within the last `months`.
    pub async fn hent_utbetalte_utbetalinger(
        &self,
        user: &AuthenticatedUser,
        months: u32,
    ) -> Result<Vec<UtbetalingerResponse>, Error> {
        let utbetalinger = self
            .manedsutbetalinger(user, months, |status| status == UtbetalingsStatus::Utbetalt)
            .await?;
        Ok(grupper_per_maned(utbetalinger)
            .into_iter()
            .map(|gruppe| UtbetalingerResponse {
                ar: gruppe.ar,
                maned: gruppe.maned,
                foerste_i_maneden: gruppe.foerste_i_maneden,
                utbetalinger: gruppe.utbetalinger,
            })
            .collect())
    }

    /// Planned utbetalinger, and stopped ones that were due in the future.
    pub async fn hent_nye_utbetalinger(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<KommendeOgUtbetalteUtbetalingerResponse>, Error> {
        let idag = now_local(self.clock.as_ref()).date();
        let utbetalinger = self
            .manedsutbetalinger(user, KOMMENDE_OG_TIDLIGERE_MANEDER, |status| {
                matches!(
                    status,
                    UtbetalingsStatus::PlanlagtUtbetaling | UtbetalingsStatus::Stoppet
                )
            })
            .await?
            .into_iter()
            .filter(|utbetaling| {
                utbetaling.utbetalingsdato.is_some_and(|dato| dato > idag)
                    || utbetaling.status == UtbetalingsStatus::PlanlagtUtbetaling
            })
            .collect();
        Ok(kommende_og_utbetalte(utbetalinger))
    }

    /// Paid utbetalinger, and stopped ones whose date has passed.
    pub async fn hent_tidligere_utbetalinger(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<KommendeOgUtbetalteUtbetalingerResponse>, Error> {
        let idag = now_local(self.clock.as_ref()).date();
        let utbetalinger = self
            .manedsutbetalinger(user, KOMMENDE_OG_TIDLIGERE_MANEDER, |status| {
                matches!(status, UtbetalingsStatus::Utbetalt | UtbetalingsStatus::Stoppet)
            })
            .await?
            .into_iter()
            .filter(|utbetaling| {
                utbetaling.utbetalingsdato.is_none_or(|dato| dato <= idag)
                    || utbetaling.status == UtbetalingsStatus::Utbetalt
            })
            .collect();
        Ok(kommende_og_utbetalte(utbetalinger))
    }

    /// Every visible utbetaling, one entry per referanse.
    pub async fn hent_utbetalinger(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<UtbetalingDto>, Error> {
        let saker = self.fiks.hent_alle_digisos_saker(user).await?;
        if saker.is_empty() {
            info!("fant ingen søknader for bruker");
            return Ok(Vec::new());
        }
        let modeller = try_join_all(
            saker
                .iter()
                .map(|sak| self.event.hent_alle_utbetalinger(sak, user)),
        )
        .await?;

        let alle: Vec<UtbetalingDto> = saker
            .iter()
            .zip(&modeller)
            .flat_map(|(sak, model)| {
                model
                    .utbetalinger
                    .iter()
                    .filter(|utbetaling| utbetaling.status != UtbetalingsStatus::Annullert)
                    .filter(|utbetaling| {
                        utbetaling.utbetalingsdato.is_some() || utbetaling.forfallsdato.is_some()
                    })
                    .map(|utbetaling| UtbetalingDto::from_utbetaling(utbetaling, &sak.fiks_digisos_id))
            })
            .collect();
        Ok(fjern_duplikater(alle))
    }

    async fn manedsutbetalinger(
        &self,
        user: &AuthenticatedUser,
        months: u32,
        status_filter: impl Fn(UtbetalingsStatus) -> bool,
    ) -> Result<Vec<ManedUtbetaling>, Error> {
        let saker = self.fiks.hent_alle_digisos_saker(user).await?;
        if saker.is_empty() {
            info!("fant ingen søknader for bruker");
            return Ok(Vec::new());
        }
        let grense = now_local(self.clock.as_ref())
            .date()
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        let aktuelle: Vec<&DigisosSak> = saker
            .iter()
            .filter(|sak| {
                unix_to_local_datetime(sak.sist_endret).is_some_and(|endret| endret.date() >= grense)
            })
            .collect();
        let modeller = try_join_all(
            aktuelle
                .iter()
                .map(|sak| self.event.hent_alle_utbetalinger(sak, user)),
        )
        .await?;

        Ok(aktuelle
            .iter()
            .zip(&modeller)
            .flat_map(|(sak, model)| {
                model
                    .utbetalinger
                    .iter()
                    .filter(|utbetaling| {
                        utbetaling.utbetalingsdato.is_some() && status_filter(utbetaling.status)
                    })
                    .map(|utbetaling| {
                        log_manglende_dato(utbetaling, &sak.kommunenummer);
                        ManedUtbetaling {
                            tittel: tittel(utbetaling),
                            belop: utbetaling.belop,
                            utbetalingsdato: utbetaling.utbetalingsdato,
                            forfallsdato: utbetaling.forfallsdato,
                            status: utbetaling.status,
                            fiks_digisos_id: sak.fiks_digisos_id.clone(),
                            fom: utbetaling.fom,
                            tom: utbetaling.tom,
                            mottaker: utbetaling.mottaker.clone(),
                            annen_mottaker: utbetaling.annen_mottaker,
                            kontonummer: utbetaling.kontonummer.clone(),
                            utbetalingsmetode: utbetaling.utbetalingsmetode.clone(),
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

fn tittel(utbetaling: &Utbetaling) -> String {
    utbetaling
        .beskrivelse
        .clone()
        .unwrap_or_else(|| UTBETALING_DEFAULT_TITTEL.to_owned())
}

fn log_manglende_dato(utbetaling: &Utbetaling, kommunenummer: &str) {
    let mangler = match utbetaling.status {
        UtbetalingsStatus::Utbetalt => utbetaling.utbetalingsdato.is_none(),
        UtbetalingsStatus::PlanlagtUtbetaling => utbetaling.forfallsdato.is_none(),
        UtbetalingsStatus::Stoppet => {
            utbetaling.forfallsdato.is_none() || utbetaling.utbetalingsdato.is_none()
        }
        UtbetalingsStatus::Annullert => false,
    };
    if mangler {
        info!(
            referanse = %utbetaling.referanse,
            status = ?utbetaling.status,
            kommunenummer,
            "utbetaling mangler utbetalingsdato eller forfallsdato"
        );
    }
}

struct ManedsGruppe {
    ar: i32,
    maned: String,
    foerste_i_maneden: NaiveDate,
    utbetalinger: Vec<ManedUtbetaling>,
}

/// Newest month first, newest utbetaling first within each month.
fn grupper_per_maned(mut utbetalinger: Vec<ManedUtbetaling>) -> Vec<ManedsGruppe> {
    utbetalinger.sort_by(|a, b| b.utbetalingsdato.cmp(&a.utbetalingsdato));
    let mut grupper: Vec<ManedsGruppe> = Vec::new();
    for utbetaling in utbetalinger {
        let Some(dato) = utbetaling.utbetalingsdato else {
            continue;
        };
        match grupper
            .iter_mut()
            .find(|gruppe| gruppe.ar == dato.year() && gruppe.foerste_i_maneden.month() == dato.month())
        {
            Some(gruppe) => gruppe.utbetalinger.push(utbetaling),
            None => {
                let Some(foerste_i_maneden) = dato.with_day(1) else {
                    continue;
                };
                grupper.push(ManedsGruppe {
                    ar: dato.year(),
                    maned: norsk_maanedsnavn(dato.month())
                        .unwrap_or_default()
                        .to_owned(),
                    foerste_i_maneden,
                    utbetalinger: vec![utbetaling],
                });
            }
        }
    }
    grupper
}

fn kommende_og_utbetalte(
    utbetalinger: Vec<ManedUtbetaling>,
) -> Vec<KommendeOgUtbetalteUtbetalingerResponse> {
    grupper_per_maned(utbetalinger)
        .into_iter()
        .map(|gruppe| KommendeOgUtbetalteUtbetalingerResponse {
            ar: gruppe.ar,
            maned: gruppe.maned,
            utbetalinger: gruppe.utbetalinger,
        })
        .collect()
}

fn fjern_duplikater(alle: Vec<UtbetalingDto>) -> Vec<UtbetalingDto> {
    let mut antall: HashMap<&str, usize> = HashMap::new();
    for utbetaling in &alle {
        *antall.entry(utbetaling.referanse.as_str()).or_default() += 1;
    }
    let duplikater: Vec<String> = alle
        .iter()
        .filter(|utbetaling| {
            antall
                .get(utbetaling.referanse.as_str())
                .is_some_and(|n| *n > 1)
        })
        .map(|utbetaling| {
            format!(
                "fiksDigisosId={}, referanse={}",
                utbetaling.fiks_digisos_id, utbetaling.referanse
            )
        })
        .collect();
    if !duplikater.is_empty() {
        warn!(duplikater = %duplikater.join(", "), "fant duplikate utbetalinger");
    }

    let mut unike: Vec<UtbetalingDto> = Vec::with_capacity(alle.len());
    for utbetaling in alle {
        if !unike.iter().any(|u| u.referanse == utbetaling.referanse) {
            unike.push(utbetaling);
        }
    }
    unike
}
