use tracing::info;

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonForelopigSvar;
use crate::domain::model::{Hendelse, HendelseTekstType, InternalDigisosSoker, UrlResponse};
use crate::domain::support::DokumentUrls;

impl InternalDigisosSoker {
    pub(crate) fn apply_forelopig_svar(
        &mut self,
        hendelse: &JsonForelopigSvar,
        urls: &DokumentUrls,
    ) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let url = urls.url_for(&hendelse.forvaltningsbrev.referanse);
        self.forelopig_svar.har_mottatt_forelopig_svar = true;
        self.forelopig_svar.link = Some(url.clone());

        info!("hendelse: foreløpig svar");
        self.historikk.push(
            Hendelse::new(HendelseTekstType::BrevOmSaksbehandlingstid, tid)
                .with_url(Some(UrlResponse::vis_brevet(url))),
        );
        Ok(())
    }
}
