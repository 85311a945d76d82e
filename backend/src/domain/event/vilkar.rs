use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonVilkar;
use crate::domain::model::{InternalDigisosSoker, Oppgavestatus, Vilkar};

impl InternalDigisosSoker {
    pub(crate) fn apply_vilkar(&mut self, hendelse: &JsonVilkar) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let status = hendelse.status.unwrap_or(Oppgavestatus::Relevant);

        let vilkar = match self
            .vilkar
            .iter_mut()
            .find(|vilkar| vilkar.referanse == hendelse.vilkarreferanse)
        {
            Some(existing) => {
                existing.tittel = hendelse.tittel.clone();
                existing.beskrivelse = hendelse.beskrivelse.clone();
                existing.status = status;
                existing.dato_sist_endret = tid;
                existing.utbetalingsreferanser = hendelse.utbetalingsreferanse.clone();
                existing.clone()
            }
            None => {
                let vilkar = Vilkar {
                    referanse: hendelse.vilkarreferanse.clone(),
                    tittel: hendelse.tittel.clone(),
                    beskrivelse: hendelse.beskrivelse.clone(),
                    status,
                    dato_lagt_til: tid,
                    dato_sist_endret: tid,
                    utbetalingsreferanser: hendelse.utbetalingsreferanse.clone(),
                };
                self.vilkar.push(vilkar.clone());
                vilkar
            }
        };

        let mut koblet = false;
        let utbetalinger = self
            .saker
            .iter_mut()
            .flat_map(|sak| sak.utbetalinger.iter_mut())
            .chain(self.utbetalinger.iter_mut());
        for utbetaling in utbetalinger {
            utbetaling
                .vilkar
                .retain(|existing| existing.referanse != vilkar.referanse);
            if vilkar.utbetalingsreferanser.contains(&utbetaling.referanse) {
                utbetaling.vilkar.push(vilkar.clone());
                koblet = true;
            }
        }
        if !koblet {
            warn!(
                vilkarreferanse = %hendelse.vilkarreferanse,
                "fant ingen utbetalinger å knytte vilkår til"
            );
        }
        info!(status = ?status, "hendelse: vilkår");
        Ok(())
    }
}
