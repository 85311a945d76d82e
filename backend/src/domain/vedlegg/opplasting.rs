//! Upload of ettersendte vedlegg.
//!
//! Every file is validated first. Only when all files pass are they renamed,
//! encrypted for the dokumentlager and posted to Fiks together with a
//! generated receipt and a `vedlegg.json` specification.

use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::filnavn::{contains_illegal_characters, lag_filnavn, sanitize_file_name};
use super::validering::{
    FilType, MAKS_FILSTORRELSE, ValidationResult, ValidationValue, har_avvist_bildeendelse,
};
use crate::domain::digisos::{
    DigisosSak, JsonFiler, JsonVedlegg, JsonVedleggSpesifikasjon, LASTET_OPP_STATUS,
};
use crate::domain::fiks::map_fiks_error;
use crate::domain::model::Hendelsetype;
use crate::domain::pdf::{ETTERSENDELSE_PDF, VedleggOppsummering};
use crate::domain::ports::{
    CachePolicy, DocumentEncryptor, DokumentlagerClient, Ettersending, KryptertFil,
    PdfInspection, PdfInspector, VirusScanError, VirusScanner,
};
use crate::domain::support::sha512_hex;
use crate::domain::{AuthenticatedUser, Error, EttersendelsePdfGenerator, FiksService};

/// Kommune whose søknader do not accept ettersendelser.
const KOMMUNE_UTEN_ETTERSENDELSE: &str = "1507";

const COUNTER_SUFFIX_LENGTH: usize = 4;

/// One entry of the `metadata.json` part.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpplastetVedleggMetadata {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub tilleggsinfo: Option<String>,
    #[serde(default)]
    pub hendelsetype: Option<Hendelsetype>,
    #[serde(default)]
    pub hendelsereferanse: Option<String>,
    pub filer: Vec<OpplastetFilMetadata>,
    #[serde(default)]
    pub innsendelsesfrist: Option<NaiveDate>,
}

impl OpplastetVedleggMetadata {
    /// Decode the `metadata.json` part.
    pub fn parse_liste(bytes: &[u8]) -> Result<Vec<Self>, Error> {
        serde_json::from_slice(bytes).map_err(|err| {
            warn!(error = %err, "metadata.json kunne ikke leses");
            Error::filopplasting("Ugyldig metadata.json")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct OpplastetFilMetadata {
    pub filnavn: String,
    pub uuid: Uuid,
}

/// A file part of the upload; its filename embeds the metadata uuid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnsendtFil {
    pub filnavn: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OppgaveOpplastingResponse {
    #[serde(rename = "type")]
    pub type_: String,
    pub tilleggsinfo: Option<String>,
    pub innsendelsesfrist: Option<NaiveDate>,
    pub hendelsetype: Option<Hendelsetype>,
    pub hendelsereferanse: Option<String>,
    pub filer: Vec<VedleggOpplastingResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VedleggOpplastingResponse {
    pub filnavn: String,
    pub status: ValidationValue,
}

/// A metadata file paired with its uploaded part.
struct KobletFil<'a> {
    metadata: &'a OpplastetFilMetadata,
    fil: &'a InnsendtFil,
}

#[derive(Clone)]
pub struct VedleggOpplastingService {
    fiks: FiksService,
    dokumentlager: Arc<dyn DokumentlagerClient>,
    virus_scanner: Arc<dyn VirusScanner>,
    encryptor: Arc<dyn DocumentEncryptor>,
    pdf_inspector: Arc<dyn PdfInspector>,
    ettersendelse_pdf: EttersendelsePdfGenerator,
}

impl VedleggOpplastingService {
    pub fn new(
        fiks: FiksService,
        dokumentlager: Arc<dyn DokumentlagerClient>,
        virus_scanner: Arc<dyn VirusScanner>,
        encryptor: Arc<dyn DocumentEncryptor>,
        pdf_inspector: Arc<dyn PdfInspector>,
        ettersendelse_pdf: EttersendelsePdfGenerator,
    ) -> Self {
        Self {
            fiks,
            dokumentlager,
            virus_scanner,
            encryptor,
            pdf_inspector,
            ettersendelse_pdf,
        }
    }

    /// Validate and, when every file passes, send the files to Fiks.
    ///
    /// The returned list carries one status per file in either case.
    pub async fn send_vedlegg(
        &self,
        fiks_digisos_id: &str,
        metadata: &[OpplastetVedleggMetadata],
        filer: &[InnsendtFil],
        user: &AuthenticatedUser,
    ) -> Result<Vec<OppgaveOpplastingResponse>, Error> {
        info!(fiks_digisos_id, "forsøker å starte ettersendelse");
        if filer.is_empty() {
            return Err(Error::filopplasting("Ingen filer i forsendelse"));
        }
        let koblede = koble_filer(metadata, filer)?;
        let valideringer = self.valider(&koblede).await?;
        let responses = lag_responses(metadata, &koblede, &valideringer);

        if valideringer.iter().flatten().any(|validering| !validering.is_ok()) {
            info!(fiks_digisos_id, "validering av vedlegg feilet, sender ikke til Fiks");
            return Ok(responses);
        }

        let sak = self
            .fiks
            .hent_digisos_sak(fiks_digisos_id, user, CachePolicy::Bypass)
            .await?;
        if sak.kommunenummer == KOMMUNE_UTEN_ETTERSENDELSE {
            error!(kommunenummer = %sak.kommunenummer, "ettersendelse er ikke mulig for kommunen");
            return Err(Error::unexpected(
                "Kan ikke laste opp vedlegg på søknad fra Ålesund kommune",
            ));
        }

        let ettersending = self
            .lag_ettersending(&sak, metadata, &koblede, &valideringer)
            .await?;
        let antall_filer = ettersending.filer.len();
        let nav_ekstern_ref_id = ettersending.nav_ekstern_ref_id.clone();
        self.fiks.last_opp_ettersendelse(ettersending, user).await?;
        info!(
            kommunenummer = %sak.kommunenummer,
            nav_ekstern_ref_id,
            antall_filer,
            "sendte ettersendelse til Fiks"
        );
        Ok(responses)
    }

    async fn valider(&self, koblede: &[Vec<KobletFil<'_>>]) -> Result<Vec<Vec<ValidationResult>>, Error> {
        let mut valideringer = Vec::with_capacity(koblede.len());
        for filer in koblede {
            let resultater = join_all(filer.iter().map(|fil| self.valider_fil(fil))).await;
            valideringer.push(resultater.into_iter().collect::<Result<Vec<_>, _>>()?);
        }
        Ok(valideringer)
    }

    async fn valider_fil(&self, koblet: &KobletFil<'_>) -> Result<ValidationResult, Error> {
        let filnavn = &koblet.metadata.filnavn;
        let data = &koblet.fil.data;
        if data.len() > MAKS_FILSTORRELSE {
            return Ok(ValidationResult::rejected(ValidationValue::FileTooLarge));
        }
        if contains_illegal_characters(filnavn) {
            return Ok(ValidationResult::rejected(ValidationValue::IllegalFilename));
        }
        self.virus_scanner
            .scan(filnavn, data)
            .await
            .map_err(|err: VirusScanError| {
                warn!(error = %err, "virus funnet i opplastet vedlegg");
                Error::virus_found()
            })?;
        Ok(self.valider_filtype(&koblet.fil.filnavn, data))
    }

    fn valider_filtype(&self, filnavn: &str, data: &[u8]) -> ValidationResult {
        let Some(fil_type) = FilType::detect(data) else {
            warn!(
                forste_bytes = ?data.iter().take(8).collect::<Vec<_>>(),
                "ukjent filtype"
            );
            return ValidationResult::rejected(ValidationValue::IllegalFileType);
        };
        match fil_type {
            FilType::Pdf => match self.pdf_inspector.inspect(data) {
                PdfInspection::Ok => ValidationResult::ok(FilType::Pdf),
                PdfInspection::Encrypted => {
                    warn!("PDF er kryptert");
                    ValidationResult::rejected(ValidationValue::PdfIsEncrypted)
                }
                PdfInspection::Unreadable => {
                    warn!("PDF kunne ikke åpnes");
                    ValidationResult::rejected(ValidationValue::CouldNotLoadDocument)
                }
            },
            FilType::Png | FilType::Jpeg if har_avvist_bildeendelse(fil_type, filnavn) => {
                warn!(?fil_type, "bildefil har en filendelse vi ikke godtar");
                ValidationResult::rejected(ValidationValue::IllegalFileType)
            }
            FilType::Png | FilType::Jpeg => ValidationResult::ok(fil_type),
        }
    }

    async fn lag_ettersending(
        &self,
        sak: &DigisosSak,
        metadata: &[OpplastetVedleggMetadata],
        koblede: &[Vec<KobletFil<'_>>],
        valideringer: &[Vec<ValidationResult>],
    ) -> Result<Ettersending, Error> {
        let mut ukrypterte: Vec<(String, &'static str, &[u8])> = Vec::new();
        let mut spesifikasjon = Vec::with_capacity(metadata.len());
        let mut oppsummering = Vec::with_capacity(metadata.len());

        for ((vedlegg, filer), resultater) in metadata.iter().zip(koblede).zip(valideringer) {
            let mut json_filer = Vec::with_capacity(filer.len());
            for (koblet, validering) in filer.iter().zip(resultater) {
                let fil_type = validering
                    .fil_type
                    .ok_or_else(|| Error::unexpected("Validert fil mangler filtype"))?;
                let filnavn = lag_filnavn(&koblet.metadata.filnavn, koblet.metadata.uuid, fil_type);
                json_filer.push(JsonFiler {
                    filnavn: filnavn.clone(),
                    sha512: Some(sha512_hex(&koblet.fil.data)),
                });
                ukrypterte.push((filnavn, fil_type.mimetype(), koblet.fil.data.as_slice()));
            }
            oppsummering.push(VedleggOppsummering {
                type_: vedlegg.type_.clone(),
                filnavn: json_filer.iter().map(|fil| fil.filnavn.clone()).collect(),
            });
            spesifikasjon.push(JsonVedlegg {
                type_: vedlegg.type_.clone(),
                tilleggsinfo: vedlegg.tilleggsinfo.clone(),
                status: LASTET_OPP_STATUS.to_owned(),
                filer: json_filer,
                hendelse_type: vedlegg.hendelsetype,
                hendelse_referanse: vedlegg.hendelsereferanse.clone(),
            });
        }

        let kvittering = self.ettersendelse_pdf.generate(&oppsummering, &sak.soker_fnr)?;
        ukrypterte.push((ETTERSENDELSE_PDF.to_owned(), "application/pdf", kvittering.as_slice()));

        let sertifikat = self
            .dokumentlager
            .hent_dokumentlager_public_key()
            .await
            .map_err(|err| map_fiks_error("hentDokumentlagerPublicKey", err))?;
        let filer = ukrypterte
            .into_iter()
            .map(|(filnavn, mimetype, data)| {
                let kryptert = self.encryptor.encrypt(data, &sertifikat).map_err(|err| {
                    error!(error = %err, "det skjedde en feil under kryptering");
                    Error::unexpected("Kryptering av vedlegg feilet")
                })?;
                Ok(KryptertFil {
                    filnavn,
                    mimetype: mimetype.to_owned(),
                    storrelse: i64::try_from(data.len()).unwrap_or(i64::MAX),
                    data: kryptert,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Ettersending {
            fiks_digisos_id: sak.fiks_digisos_id.clone(),
            kommunenummer: sak.kommunenummer.clone(),
            nav_ekstern_ref_id: lag_nav_ekstern_ref_id(sak),
            vedlegg_spesifikasjon: JsonVedleggSpesifikasjon {
                vedlegg: spesifikasjon,
            },
            filer,
        })
    }
}

fn koble_filer<'a>(
    metadata: &'a [OpplastetVedleggMetadata],
    filer: &'a [InnsendtFil],
) -> Result<Vec<Vec<KobletFil<'a>>>, Error> {
    metadata
        .iter()
        .map(|vedlegg| {
            vedlegg
                .filer
                .iter()
                .map(|fil_metadata| {
                    let uuid = fil_metadata.uuid.to_string();
                    filer
                        .iter()
                        .find(|fil| fil.filnavn.contains(&uuid))
                        .map(|fil| KobletFil {
                            metadata: fil_metadata,
                            fil,
                        })
                        .ok_or_else(|| {
                            warn!(uuid, "fil i metadata var ikke i listen over filer");
                            Error::filopplasting("Fil i metadata var ikke i listen over filer")
                        })
                })
                .collect()
        })
        .collect()
}

fn lag_responses(
    metadata: &[OpplastetVedleggMetadata],
    koblede: &[Vec<KobletFil<'_>>],
    valideringer: &[Vec<ValidationResult>],
) -> Vec<OppgaveOpplastingResponse> {
    metadata
        .iter()
        .zip(koblede)
        .zip(valideringer)
        .map(|((vedlegg, filer), resultater)| OppgaveOpplastingResponse {
            type_: vedlegg.type_.clone(),
            tilleggsinfo: vedlegg.tilleggsinfo.clone(),
            innsendelsesfrist: vedlegg.innsendelsesfrist,
            hendelsetype: vedlegg.hendelsetype,
            hendelsereferanse: vedlegg.hendelsereferanse.clone(),
            filer: filer
                .iter()
                .zip(resultater)
                .map(|(koblet, validering)| VedleggOpplastingResponse {
                    filnavn: sanitize_file_name(&koblet.metadata.filnavn),
                    status: validering.value,
                })
                .collect(),
        })
        .collect()
}

/// Next navEksternRefId for an ettersendelse on the sak.
///
/// The last four digits are a counter. The highest existing ettersendelse
/// is incremented; without ettersendelser the count starts from the
/// søknad's own reference, or from the digisos id for paper søknader.
///
/// # Examples
/// ```
/// use innsyn_api::domain::digisos::DigisosSak;
/// use innsyn_api::domain::vedlegg::lag_nav_ekstern_ref_id;
///
/// let sak: DigisosSak = serde_json::from_value(serde_json::json!({
///     "fiksDigisosId": "abc",
///     "sokerFnr": "12345678910",
///     "fiksOrgId": "org",
///     "kommunenummer": "0301",
///     "sistEndret": 0
/// }))
/// .expect("valid sak");
/// assert_eq!(lag_nav_ekstern_ref_id(&sak), "abc0001");
/// ```
pub fn lag_nav_ekstern_ref_id(sak: &DigisosSak) -> String {
    let forrige = sak
        .ettersendelser()
        .iter()
        .map(|ettersendelse| ettersendelse.nav_ekstern_ref_id.clone())
        .max_by_key(|id| teller(id))
        .or_else(|| {
            sak.original_soknad_nav
                .as_ref()
                .map(|original| format!("{}0000", original.nav_ekstern_ref_id))
        })
        .unwrap_or_else(|| format!("{}0000", sak.fiks_digisos_id));

    let lengde = forrige.chars().count();
    let prefiks: String = forrige
        .chars()
        .take(lengde.saturating_sub(COUNTER_SUFFIX_LENGTH))
        .collect();
    format!("{prefiks}{:04}", teller(&forrige) + 1)
}

fn teller(id: &str) -> u64 {
    let lengde = id.chars().count();
    id.chars()
        .skip(lengde.saturating_sub(COUNTER_SUFFIX_LENGTH))
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
