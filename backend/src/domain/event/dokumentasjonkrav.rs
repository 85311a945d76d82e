use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonDokumentasjonkrav;
use crate::domain::model::{
    Dokumentasjonkrav, Hendelse, HendelseTekstType, InternalDigisosSoker, Oppgavestatus,
};
use crate::domain::support::{sha256_hex, to_local_datetime};

impl InternalDigisosSoker {
    pub(crate) fn apply_dokumentasjonkrav(
        &mut self,
        hendelse: &JsonDokumentasjonkrav,
    ) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let status = hendelse.status.unwrap_or(Oppgavestatus::Relevant);
        let frist = hendelse
            .frist
            .as_deref()
            .and_then(to_local_datetime)
            .map(|frist| frist.date());

        let krav = match self
            .dokumentasjonkrav
            .iter_mut()
            .find(|krav| krav.referanse == hendelse.dokumentasjonkravreferanse)
        {
            Some(existing) => {
                existing.tittel = hendelse.tittel.clone();
                existing.beskrivelse = hendelse.beskrivelse.clone();
                existing.status = status;
                existing.dato_sist_endret = tid;
                existing.frist = frist;
                existing.utbetalingsreferanser = hendelse.utbetalingsreferanse.clone();
                existing.clone()
            }
            None => {
                let krav = Dokumentasjonkrav {
                    dokumentasjonkrav_id: sha256_hex(hendelse.frist.as_deref().unwrap_or_default()),
                    referanse: hendelse.dokumentasjonkravreferanse.clone(),
                    tittel: hendelse.tittel.clone(),
                    beskrivelse: hendelse.beskrivelse.clone(),
                    status,
                    dato_lagt_til: tid,
                    dato_sist_endret: tid,
                    frist,
                    utbetalingsreferanser: hendelse.utbetalingsreferanse.clone(),
                };
                self.dokumentasjonkrav.push(krav.clone());
                krav
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
                .dokumentasjonkrav
                .retain(|existing| existing.referanse != krav.referanse);
            if krav.utbetalingsreferanser.contains(&utbetaling.referanse) {
                utbetaling.dokumentasjonkrav.push(krav.clone());
                koblet = true;
            }
        }
        if !koblet {
            warn!(
                dokumentasjonkravreferanse = %hendelse.dokumentasjonkravreferanse,
                "fant ingen utbetalinger å knytte dokumentasjonkrav til"
            );
            return Ok(());
        }

        info!(status = ?status, "hendelse: dokumentasjonkrav");
        self.historikk
            .push(Hendelse::new(HendelseTekstType::Dokumentasjonkrav, tid));
        Ok(())
    }
}
