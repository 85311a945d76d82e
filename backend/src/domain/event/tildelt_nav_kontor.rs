use tracing::info;

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonTildeltNavKontor;
use crate::domain::model::{
    Hendelse, HendelseTekstType, HistorikkType, InternalDigisosSoker, Soknadsmottaker,
};

const ET_ANNET_NAV_KONTOR: &str = "et annet NAV-kontor";

impl InternalDigisosSoker {
    /// True when the hendelse moves the søknad to an office whose name must
    /// be looked up in NORG.
    pub(crate) fn trenger_norg_oppslag(&self, hendelse: &JsonTildeltNavKontor) -> bool {
        !self.er_allerede_tildelt(hendelse) && !self.er_soknadsmottaker(hendelse)
    }

    pub(crate) fn apply_tildelt_nav_kontor(
        &mut self,
        hendelse: &JsonTildeltNavKontor,
        nav_enhetsnavn: Option<String>,
        is_papir_soknad: bool,
    ) -> Result<(), Error> {
        if self.er_allerede_tildelt(hendelse) {
            return Ok(());
        }
        if self.er_soknadsmottaker(hendelse) {
            self.tildelt_nav_kontor = Some(hendelse.nav_kontor.clone());
            return Ok(());
        }

        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let forste_tildeling = self.tildelt_nav_kontor.is_none();
        self.tildelt_nav_kontor = Some(hendelse.nav_kontor.clone());
        self.soknadsmottaker = Some(Soknadsmottaker {
            nav_enhetsnummer: Some(hendelse.nav_kontor.clone()),
            nav_enhetsnavn: Some(
                nav_enhetsnavn
                    .clone()
                    .unwrap_or_else(|| ET_ANNET_NAV_KONTOR.to_owned()),
            ),
        });

        let tekst = match (is_papir_soknad && forste_tildeling, nav_enhetsnavn.is_some()) {
            (true, true) => HendelseTekstType::SoknadVideresendtPapirsoknadMedNorgEnhet,
            (true, false) => HendelseTekstType::SoknadVideresendtPapirsoknadUtenNorgEnhet,
            (false, true) => HendelseTekstType::SoknadVideresendtMedNorgEnhet,
            (false, false) => HendelseTekstType::SoknadVideresendtUtenNorgEnhet,
        };
        info!(nav_kontor = %hendelse.nav_kontor, hendelse_type = tekst.name(), "hendelse: tildelt NAV-kontor");
        self.historikk.push(
            Hendelse::new(tekst, tid)
                .with_tekst_argument(nav_enhetsnavn)
                .with_historikk_type(HistorikkType::TildeltNavKontor),
        );
        Ok(())
    }

    fn er_allerede_tildelt(&self, hendelse: &JsonTildeltNavKontor) -> bool {
        self.tildelt_nav_kontor.as_deref() == Some(hendelse.nav_kontor.as_str())
    }

    fn er_soknadsmottaker(&self, hendelse: &JsonTildeltNavKontor) -> bool {
        self.soknadsmottaker
            .as_ref()
            .and_then(|mottaker| mottaker.nav_enhetsnummer.as_deref())
            == Some(hendelse.nav_kontor.as_str())
    }
}
