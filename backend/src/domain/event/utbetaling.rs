use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonUtbetaling;
use crate::domain::model::{InternalDigisosSoker, Utbetaling, UtbetalingsStatus};

impl InternalDigisosSoker {
    /// Replace an utbetaling by referanse. The new entry goes last and starts
    /// without vilkår and dokumentasjonkrav.
    pub(crate) fn apply_utbetaling(&mut self, hendelse: &JsonUtbetaling) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let annen_mottaker = hendelse.annen_mottaker.unwrap_or(true);

        let utbetaling = Utbetaling {
            referanse: hendelse.utbetalingsreferanse.clone(),
            status: hendelse.status.unwrap_or(UtbetalingsStatus::PlanlagtUtbetaling),
            belop: hendelse.belop.unwrap_or_default(),
            beskrivelse: hendelse.beskrivelse.clone(),
            forfallsdato: hendelse.forfallsdato,
            utbetalingsdato: hendelse.utbetalingsdato,
            stoppetdato: hendelse.stoppetdato,
            fom: hendelse.fom,
            tom: hendelse.tom,
            mottaker: hendelse.mottaker.clone(),
            annen_mottaker,
            kontonummer: if annen_mottaker {
                None
            } else {
                hendelse.kontonummer.clone()
            },
            utbetalingsmetode: hendelse.utbetalingsmetode.clone(),
            vilkar: Vec::new(),
            dokumentasjonkrav: Vec::new(),
            dato_hendelse: tid,
        };

        let saksreferanse = hendelse.saksreferanse.as_deref().unwrap_or_default();
        match self.sak_index(saksreferanse).and_then(|index| self.saker.get_mut(index)) {
            Some(sak) => move_to_end(&mut sak.utbetalinger, utbetaling.clone()),
            None => warn!(
                utbetalingsreferanse = %hendelse.utbetalingsreferanse,
                "fant ingen sak for utbetaling"
            ),
        }
        move_to_end(&mut self.utbetalinger, utbetaling);
        info!(status = ?hendelse.status, "hendelse: utbetaling");
        Ok(())
    }
}

fn move_to_end(utbetalinger: &mut Vec<Utbetaling>, utbetaling: Utbetaling) {
    utbetalinger.retain(|existing| existing.referanse != utbetaling.referanse);
    utbetalinger.push(utbetaling);
}
