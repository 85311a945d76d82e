use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonSaksStatus;
use crate::domain::model::{
    Hendelse, HendelseTekstType, InternalDigisosSoker, Sak, SaksStatus, SoknadsStatus,
};

impl InternalDigisosSoker {
    pub(crate) fn apply_saks_status(&mut self, hendelse: &JsonSaksStatus) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;

        if let Some(sak) = self
            .saker
            .iter_mut()
            .find(|sak| sak.referanse == hendelse.referanse)
        {
            let forrige = sak.saks_status;
            sak.tittel = hendelse.tittel.clone();
            if let Some(status) = hendelse.status {
                sak.saks_status = Some(status);
            }
            let kan_ikke_vise = matches!(
                hendelse.status,
                Some(SaksStatus::IkkeInnsyn | SaksStatus::BehandlesIkke)
            );
            if kan_ikke_vise && forrige != hendelse.status {
                let tekst = if hendelse.tittel.is_some() {
                    HendelseTekstType::SoknadKanIkkeViseStatusMedTittel
                } else {
                    HendelseTekstType::SoknadKanIkkeViseStatusUtenTittel
                };
                self.historikk.push(
                    Hendelse::new(tekst, tid)
                        .with_tekst_argument(hendelse.tittel.clone())
                        .with_saks_referanse(Some(hendelse.referanse.clone())),
                );
            }
            return Ok(());
        }

        let status = hendelse.status.unwrap_or(SaksStatus::UnderBehandling);
        self.saker.push(Sak {
            referanse: hendelse.referanse.clone(),
            saks_status: Some(status),
            tittel: hendelse.tittel.clone(),
            vedtak: Vec::new(),
            utbetalinger: Vec::new(),
        });

        let har_tittel = hendelse.tittel.is_some();
        let tekst = match status {
            SaksStatus::UnderBehandling if har_tittel => HendelseTekstType::SakUnderBehandlingMedTittel,
            SaksStatus::UnderBehandling => HendelseTekstType::SakUnderBehandlingUtenTittel,
            SaksStatus::BehandlesIkke | SaksStatus::IkkeInnsyn if har_tittel => {
                HendelseTekstType::SakKanIkkeViseStatusMedTittel
            }
            SaksStatus::BehandlesIkke | SaksStatus::IkkeInnsyn => {
                HendelseTekstType::SakKanIkkeViseStatusUtenTittel
            }
            SaksStatus::Ferdigbehandlet | SaksStatus::Feilregistrert => {
                info!(referanse = %hendelse.referanse, status = ?status, "ny sak uten hendelse i historikken");
                return Ok(());
            }
        };
        if self.status == SoknadsStatus::Ferdigbehandlet {
            warn!(referanse = %hendelse.referanse, "ny sak opprettet etter at søknaden er ferdigbehandlet");
        }
        self.historikk.push(
            Hendelse::new(tekst, tid)
                .with_tekst_argument(hendelse.tittel.clone())
                .with_saks_referanse(Some(hendelse.referanse.clone())),
        );
        Ok(())
    }
}
