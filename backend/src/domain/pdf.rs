//! Receipt listing the files of one ettersendelse.
//!
//! The receipt is uploaded to Fiks as `ettersendelse.pdf` next to the
//! files it describes. Rendering is delegated to a [`PdfGenerator`].

use std::sync::Arc;

use mockable::Clock;
use tracing::{error, info};

use super::Error;
use super::ports::{PdfDocument, PdfGenerator, PdfLine};
use super::support::{format_local_datetime, now_local};

/// Filename of the generated receipt.
pub const ETTERSENDELSE_PDF: &str = "ettersendelse.pdf";

/// One vedlegg type and the final names of its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VedleggOppsummering {
    pub type_: String,
    pub filnavn: Vec<String>,
}

#[derive(Clone)]
pub struct EttersendelsePdfGenerator {
    generator: Arc<dyn PdfGenerator>,
    clock: Arc<dyn Clock>,
}

impl EttersendelsePdfGenerator {
    pub fn new(generator: Arc<dyn PdfGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    /// Layout of the receipt.
    pub fn document(&self, vedlegg: &[VedleggOppsummering], fodselsnummer: &str) -> PdfDocument {
        let sendt = format_local_datetime(now_local(self.clock.as_ref()));
        let mut lines = vec![
            PdfLine::Heading("Ettersendelse av vedlegg".to_owned()),
            PdfLine::Heading("Søknad om økonomisk sosialhjelp".to_owned()),
            PdfLine::Blank,
            PdfLine::Divider,
            PdfLine::Blank,
            PdfLine::SubHeading(fodselsnummer.to_owned()),
            PdfLine::Divider,
            PdfLine::Blank,
            PdfLine::Text(format!("Følgende vedlegg er sendt {sendt}")),
        ];
        for oppsummering in vedlegg {
            lines.push(PdfLine::Blank);
            // The embedded font has no glyph for tab.
            lines.push(PdfLine::Text(format!(
                "Type: {}",
                oppsummering.type_.replace('\t', " ")
            )));
            lines.extend(
                oppsummering
                    .filnavn
                    .iter()
                    .map(|filnavn| PdfLine::Text(format!("Filnavn: {filnavn}"))),
            );
        }
        PdfDocument {
            title: "Ettersendelse av vedlegg".to_owned(),
            lines,
        }
    }

    /// Render the receipt to PDF bytes.
    pub fn generate(
        &self,
        vedlegg: &[VedleggOppsummering],
        fodselsnummer: &str,
    ) -> Result<Vec<u8>, Error> {
        info!("starter generering av ettersendelse.pdf");
        self.generator
            .generate(&self.document(vedlegg, fodselsnummer))
            .map_err(|err| {
                error!(error = %err, "generering av ettersendelse.pdf feilet");
                Error::unexpected("Generering av ettersendelse.pdf feilet")
            })
    }
}
