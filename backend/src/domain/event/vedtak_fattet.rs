use tracing::info;

use super::tidspunkt;
use crate::domain::Error;
use crate::domain::digisos::JsonVedtakFattet;
use crate::domain::model::{
    DEFAULT_SAK_REFERANSE, DEFAULT_SAK_TITTEL, Hendelse, HendelseTekstType, InternalDigisosSoker,
    Sak, SaksStatus, UrlResponse, Vedtak,
};
use crate::domain::support::DokumentUrls;

impl InternalDigisosSoker {
    pub(crate) fn apply_vedtak_fattet(
        &mut self,
        hendelse: &JsonVedtakFattet,
        urls: &DokumentUrls,
    ) -> Result<(), Error> {
        let tid = tidspunkt(&hendelse.hendelsestidspunkt)?;
        let url = urls.url_for(&hendelse.vedtaksfil.referanse);
        let vedtak = Vedtak {
            id: hendelse.vedtaksfil.referanse.id().to_owned(),
            utfall: hendelse.utfall,
            vedtaks_fil_url: url.clone(),
            dato: Some(tid.date()),
        };

        let referanse = hendelse
            .saksreferanse
            .clone()
            .unwrap_or_else(|| DEFAULT_SAK_REFERANSE.to_owned());
        let index = match self.sak_index(&referanse) {
            Some(index) => index,
            None => {
                info!(referanse = %referanse, "vedtak fattet uten kjent sak, oppretter sak");
                self.saker.push(Sak {
                    referanse: referanse.clone(),
                    saks_status: Some(SaksStatus::UnderBehandling),
                    tittel: Some(DEFAULT_SAK_TITTEL.to_owned()),
                    vedtak: Vec::new(),
                    utbetalinger: Vec::new(),
                });
                self.saker.len() - 1
            }
        };
        let Some(sak) = self.saker.get_mut(index) else {
            return Err(Error::unexpected("Fant ikke sak for vedtak"));
        };
        sak.vedtak.push(vedtak);
        let tittel = sak.tittel.clone();
        let saks_referanse = sak.referanse.clone();

        let tekst = if tittel.is_some() {
            HendelseTekstType::SakFerdigbehandletMedTittel
        } else {
            HendelseTekstType::SakFerdigbehandletUtenTittel
        };
        self.historikk.push(
            Hendelse::new(tekst, tid)
                .with_tekst_argument(tittel)
                .with_url(Some(UrlResponse::vis_brevet(url)))
                .with_saks_referanse(Some(saks_referanse)),
        );
        Ok(())
    }
}

impl InternalDigisosSoker {
    /// Sak with the given referanse, falling back to the implicit default sak.
    pub(crate) fn sak_index(&self, referanse: &str) -> Option<usize> {
        self.saker
            .iter()
            .position(|sak| sak.referanse == referanse)
            .or_else(|| {
                self.saker
                    .iter()
                    .position(|sak| sak.referanse == DEFAULT_SAK_REFERANSE)
            })
    }
}
