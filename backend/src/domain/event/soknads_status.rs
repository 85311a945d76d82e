use tracing::{info, warn};

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonSoknadsStatus;
use crate::domain::model::{Hendelse, HendelseTekstType, InternalDigisosSoker, SoknadsStatus};
use crate::domain::support::strip_enhetsnavn_for_kommune;

impl InternalDigisosSoker {
    pub(crate) fn apply_soknads_status(&mut self, hendelse: &JsonSoknadsStatus) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        self.status = hendelse.status;

        let ny = match hendelse.status {
            SoknadsStatus::Mottatt => {
                let navn = self
                    .soknadsmottaker
                    .as_ref()
                    .and_then(|mottaker| mottaker.nav_enhetsnavn.as_deref())
                    .map(strip_enhetsnavn_for_kommune);
                let tekst = if navn.is_some() {
                    HendelseTekstType::SoknadMottattMedKommunenavn
                } else {
                    HendelseTekstType::SoknadMottattUtenKommunenavn
                };
                Hendelse::new(tekst, tid).with_tekst_argument(navn)
            }
            SoknadsStatus::UnderBehandling => {
                Hendelse::new(HendelseTekstType::SoknadUnderBehandling, tid)
            }
            SoknadsStatus::Ferdigbehandlet => {
                Hendelse::new(HendelseTekstType::SoknadFerdigbehandlet, tid)
            }
            SoknadsStatus::BehandlesIkke => {
                Hendelse::new(HendelseTekstType::SoknadBehandlesIkke, tid)
            }
            SoknadsStatus::Sendt => {
                warn!("søknadsstatus SENDT fra fagsystem gir ingen hendelse");
                return Ok(());
            }
        };

        info!(status = ?hendelse.status, hendelse_type = ny.hendelse_type.name(), "hendelse: søknadsstatus");
        self.historikk.push(ny);
        Ok(())
    }
}
