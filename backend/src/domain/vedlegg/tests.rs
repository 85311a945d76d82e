//! Listing and upload of vedlegg.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::model::Oppgave;
use crate::domain::ports::{
    Ettersending, MockDocumentEncryptor, MockDokumentlagerClient, MockPdfGenerator,
    MockPdfInspector, MockVirusScanner, PdfInspection, VirusScanError,
};
use crate::domain::support::sha512_hex;
use crate::domain::test_fixtures::{
    VEDLEGG_METADATA, clock_at, dokumenter, event_service, fiks_client, fiks_service, sak,
    sak_json, urls, user,
};
use crate::domain::{ErrorCode, EttersendelsePdfGenerator};

/// 2024-03-01T10:00:00Z
const SENDT: i64 = 1_709_287_200_000;
/// One day after [`SENDT`].
const ETTERSENDT: i64 = SENDT + 86_400_000;

const UUID_PNG: &str = "1a2b3c4d-0000-4000-8000-000000000001";
const UUID_PDF: &str = "5e6f7a8b-0000-4000-8000-000000000002";

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nbilde";
const PDF: &[u8] = b"%PDF-1.7\ninnhold";

fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .expect("valid datetime")
}

fn dokument(filnavn: &str, id: &str) -> Value {
    json!({ "filnavn": filnavn, "dokumentlagerDokumentId": id, "storrelse": 20 })
}

fn sak_med_vedlegg() -> DigisosSak {
    let mut value = sak_json(SENDT);
    value["originalSoknadNAV"]["vedlegg"] = json!([
        dokument("lonn.pdf", "dok-lonn"),
        dokument("annet.pdf", "dok-annet"),
    ]);
    value["ettersendtInfoNAV"] = json!({
        "ettersendelser": [{
            "navEksternRefId": "110000010001",
            "vedleggMetadata": "ettersendelse-1",
            "vedlegg": [
                dokument("kontrakt-1a2b3c4d.pdf", "dok-kontrakt"),
                dokument("ettersendelse.pdf", "dok-kvittering"),
                dokument("side2-5e6f7a8b.pdf", "dok-side2"),
            ],
            "timestampSendt": ETTERSENDT
        }]
    });
    sak(value)
}

fn dokumenter_med_vedlegg(ettersendte_filer: Value) -> HashMap<String, Value> {
    let mut dokumenter = dokumenter(json!([]));
    dokumenter.insert(
        VEDLEGG_METADATA.to_owned(),
        json!({ "vedlegg": [
            { "type": "lonnslipp", "tilleggsinfo": "arbeid", "status": "LastetOpp",
              "filer": [{ "filnavn": "lonn.pdf" }] },
            { "type": "husleie", "tilleggsinfo": "kontrakt", "status": "VedleggKreves", "filer": [] }
        ] }),
    );
    dokumenter.insert(
        "ettersendelse-1".to_owned(),
        json!({ "vedlegg": [
            { "type": "husleie", "tilleggsinfo": "kontrakt", "status": "LastetOpp",
              "filer": ettersendte_filer }
        ] }),
    );
    dokumenter
}

fn vedlegg_service(dokumenter: HashMap<String, Value>) -> VedleggService {
    let clock = clock_at(2024, 3, 10);
    let saker = vec![sak_med_vedlegg()];
    VedleggService::new(
        fiks_service(fiks_client(saker.clone(), dokumenter.clone())),
        event_service(saker, dokumenter, clock),
        urls(),
    )
}

#[rstest]
#[tokio::test]
async fn uploaded_files_are_listed_with_their_vedlegg_type() {
    let service = vedlegg_service(dokumenter_med_vedlegg(json!([
        { "filnavn": "kontrakt-1a2b3c4d.pdf" },
        { "filnavn": "side2-5e6f7a8b.pdf" }
    ])));

    let vedlegg = service.hent_vedlegg("123", &user()).await.expect("vedlegg");

    let oversikt: Vec<(&str, &str, Option<&str>)> = vedlegg
        .iter()
        .map(|v| (v.filnavn.as_str(), v.type_.as_str(), v.tilleggsinfo.as_deref()))
        .collect();
    assert_eq!(
        oversikt,
        vec![
            ("lonn.pdf", "lonnslipp", Some("arbeid")),
            ("kontrakt.pdf", "husleie", Some("kontrakt")),
            ("side2.pdf", "husleie", Some("kontrakt")),
        ]
    );
    assert_eq!(
        vedlegg.get(1).map(|v| v.url.as_str()),
        Some("https://dokumentlager/dokumentlager/nedlasting/niva4/dok-kontrakt?inline=true")
    );
    assert_eq!(vedlegg.first().map(|v| v.dato_lagt_til), Some(datetime(2024, 3, 1, 11, 0, 0)));
    assert_eq!(vedlegg.get(1).map(|v| v.dato_lagt_til), Some(datetime(2024, 3, 2, 11, 0, 0)));
}

#[rstest]
#[tokio::test]
async fn ettersendt_filename_mismatch_is_a_fiks_error() {
    let service = vedlegg_service(dokumenter_med_vedlegg(json!([
        { "filnavn": "noe-annet.pdf" },
        { "filnavn": "side2-5e6f7a8b.pdf" }
    ])));

    let err = service.hent_vedlegg("123", &user()).await.expect_err("mismatch");
    assert_eq!(err.code(), ErrorCode::FiksError);
}

#[rstest]
fn more_files_than_documents_yields_placeholders() {
    let sak = sak_med_vedlegg();
    let ettersendelse = sak.ettersendelser().first().expect("ettersendelse").clone();
    let spesifikasjon: JsonVedleggSpesifikasjon = serde_json::from_value(json!({ "vedlegg": [
        { "type": "husleie", "status": "LastetOpp",
          "filer": [{ "filnavn": "a.pdf" }, { "filnavn": "b.pdf" }, { "filnavn": "c.pdf" }] }
    ] }))
    .expect("spesifikasjon");

    let vedlegg =
        vedlegg_fra_ettersendelse(&ettersendelse, spesifikasjon, &InternalDigisosSoker::default())
            .expect("placeholders");

    let dokumenter = &vedlegg.first().expect("vedlegg").dokument_info_list;
    assert_eq!(dokumenter.len(), 3);
    assert!(dokumenter
        .iter()
        .all(|d| d.dokumentlager_dokument_id == "Error" && d.storrelse == -1));
}

fn internal(type_: &str, tidspunkt: NaiveDateTime, filnavn: &str) -> InternalVedlegg {
    InternalVedlegg {
        type_: type_.to_owned(),
        tilleggsinfo: None,
        hendelse_type: None,
        hendelse_referanse: None,
        dokument_info_list: vec![DokumentInfo {
            filnavn: filnavn.to_owned(),
            dokumentlager_dokument_id: filnavn.to_owned(),
            storrelse: 1,
        }],
        tidspunkt_lastet_opp: tidspunkt,
        innsendelsesfrist: None,
    }
}

#[rstest]
fn vedlegg_of_same_type_within_a_minute_are_merged() {
    let kombinert = kombiner_alle_like_vedlegg(vec![
        internal("husleie", datetime(2024, 3, 1, 12, 0, 0), "a.pdf"),
        internal("husleie", datetime(2024, 3, 1, 12, 0, 40), "b.pdf"),
        internal("husleie", datetime(2024, 3, 1, 12, 2, 0), "c.pdf"),
        internal("lonnslipp", datetime(2024, 3, 1, 12, 0, 10), "d.pdf"),
    ]);

    let filer: Vec<Vec<&str>> = kombinert
        .iter()
        .map(|v| v.dokument_info_list.iter().map(|d| d.filnavn.as_str()).collect())
        .collect();
    assert_eq!(filer, vec![vec!["a.pdf", "b.pdf"], vec!["c.pdf"], vec!["d.pdf"]]);
}

#[rstest]
fn innsendelsesfrist_is_the_latest_matching_oppgave() {
    let oppgave = |frist: Option<NaiveDateTime>, tilleggsinfo: &str| Oppgave {
        oppgave_id: "id".to_owned(),
        tittel: "husleie".to_owned(),
        tilleggsinfo: Some(tilleggsinfo.to_owned()),
        hendelsetype: None,
        hendelsereferanse: None,
        innsendelsesfrist: frist,
        tidspunkt_for_krav: datetime(2024, 3, 1, 0, 0, 0),
        er_fra_innsyn: true,
    };
    let model = InternalDigisosSoker {
        oppgaver: vec![
            oppgave(Some(datetime(2024, 3, 10, 0, 0, 0)), "kontrakt"),
            oppgave(None, "kontrakt"),
            oppgave(Some(datetime(2024, 3, 20, 0, 0, 0)), "kontrakt"),
            oppgave(Some(datetime(2024, 4, 1, 0, 0, 0)), "annet"),
        ],
        ..InternalDigisosSoker::default()
    };
    let vedlegg: JsonVedlegg = serde_json::from_value(json!({
        "type": "husleie", "tilleggsinfo": "kontrakt", "status": "LastetOpp"
    }))
    .expect("vedlegg");

    assert_eq!(
        innsendelsesfrist_fra_oppgave(&model, &vedlegg),
        Some(datetime(2024, 3, 20, 0, 0, 0))
    );
}

struct Opplasting {
    service: VedleggOpplastingService,
    sendt: Arc<Mutex<Vec<Ettersending>>>,
}

fn opplasting(kommunenummer: &str, virus: bool, inspection: PdfInspection) -> Opplasting {
    let mut value = sak_json(SENDT);
    value["kommunenummer"] = json!(kommunenummer);
    let mut fiks = fiks_client(vec![sak(value)], HashMap::new());
    let sendt = Arc::new(Mutex::new(Vec::new()));
    let mottatt = Arc::clone(&sendt);
    fiks.expect_last_opp_nye_ettersendte_vedlegg()
        .returning(move |ettersending, _| {
            mottatt.lock().expect("lock").push(ettersending);
            Ok(())
        });

    let mut dokumentlager = MockDokumentlagerClient::new();
    dokumentlager
        .expect_hent_dokumentlager_public_key()
        .returning(|| Ok(b"sertifikat".to_vec()));

    let mut scanner = MockVirusScanner::new();
    scanner.expect_scan().returning(move |filnavn, _| {
        if virus {
            Err(VirusScanError::virus_found(filnavn))
        } else {
            Ok(())
        }
    });

    let mut encryptor = MockDocumentEncryptor::new();
    encryptor
        .expect_encrypt()
        .returning(|data, _| Ok([b"kryptert:".as_slice(), data].concat()));

    let mut inspector = MockPdfInspector::new();
    inspector.expect_inspect().returning(move |_| inspection);

    let mut generator = MockPdfGenerator::new();
    generator
        .expect_generate()
        .returning(|_| Ok(b"%PDF-kvittering".to_vec()));

    Opplasting {
        service: VedleggOpplastingService::new(
            fiks_service(fiks),
            Arc::new(dokumentlager),
            Arc::new(scanner),
            Arc::new(encryptor),
            Arc::new(inspector),
            EttersendelsePdfGenerator::new(Arc::new(generator), clock_at(2024, 3, 10)),
        ),
        sendt,
    }
}

fn metadata(png_navn: &str) -> Vec<OpplastetVedleggMetadata> {
    let raw = json!([{
        "type": "husleie",
        "tilleggsinfo": "kontrakt",
        "hendelsetype": "dokumentasjonEtterspurt",
        "hendelsereferanse": "ref-1",
        "innsendelsesfrist": "2024-03-20",
        "filer": [
            { "filnavn": png_navn, "uuid": UUID_PNG },
            { "filnavn": "side 2.pdf", "uuid": UUID_PDF }
        ]
    }]);
    OpplastetVedleggMetadata::parse_liste(raw.to_string().as_bytes()).expect("metadata")
}

fn filer(png: &[u8]) -> Vec<InnsendtFil> {
    vec![
        InnsendtFil {
            filnavn: format!("{UUID_PNG}.png"),
            data: png.to_vec(),
        },
        InnsendtFil {
            filnavn: format!("{UUID_PDF}.pdf"),
            data: PDF.to_vec(),
        },
    ]
}

fn statuser(responses: &[OppgaveOpplastingResponse]) -> Vec<ValidationValue> {
    responses
        .iter()
        .flat_map(|r| r.filer.iter().map(|f| f.status))
        .collect()
}

#[rstest]
#[tokio::test]
async fn valid_files_are_renamed_encrypted_and_sent() {
    let opplasting = opplasting("0301", false, PdfInspection::Ok);

    let responses = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &filer(PNG), &user())
        .await
        .expect("upload");

    assert_eq!(statuser(&responses), vec![ValidationValue::Ok, ValidationValue::Ok]);
    let response = responses.first().expect("response");
    assert_eq!(response.innsendelsesfrist, NaiveDate::from_ymd_opt(2024, 3, 20));
    assert_eq!(
        response.filer.iter().map(|f| f.filnavn.as_str()).collect::<Vec<_>>(),
        vec!["kontrakt.png", "side 2.pdf"]
    );

    let sendt = opplasting.sendt.lock().expect("lock");
    let ettersending = sendt.first().expect("sent to fiks");
    assert_eq!(ettersending.nav_ekstern_ref_id, "110000010001");
    assert_eq!(ettersending.kommunenummer, "0301");
    assert_eq!(
        ettersending.filer.iter().map(|f| f.filnavn.as_str()).collect::<Vec<_>>(),
        vec!["kontrakt-1a2b3c4d.png", "side 2-5e6f7a8b.pdf", "ettersendelse.pdf"]
    );
    assert!(ettersending.filer.iter().all(|f| f.data.starts_with(b"kryptert:")));
    assert_eq!(ettersending.filer.first().map(|f| f.storrelse), Some(PNG.len() as i64));
    assert_eq!(
        ettersending.filer.first().map(|f| f.mimetype.as_str()),
        Some("image/png")
    );

    let vedlegg = ettersending
        .vedlegg_spesifikasjon
        .vedlegg
        .first()
        .expect("vedlegg.json");
    assert_eq!(vedlegg.status, LASTET_OPP_STATUS);
    assert_eq!(vedlegg.hendelse_type, Some(Hendelsetype::DokumentasjonEtterspurt));
    assert_eq!(
        vedlegg.filer.first().and_then(|f| f.sha512.clone()),
        Some(sha512_hex(PNG))
    );
}

#[rstest]
#[case::too_large(vec![0_u8; MAKS_FILSTORRELSE + 1], "kontrakt.png", ValidationValue::FileTooLarge)]
#[case::illegal_name(PNG.to_vec(), "kontrakt?.png", ValidationValue::IllegalFilename)]
#[case::unknown_type(b"hei".to_vec(), "kontrakt.png", ValidationValue::IllegalFileType)]
#[tokio::test]
async fn rejected_file_stops_the_whole_upload(
    #[case] data: Vec<u8>,
    #[case] filnavn: &str,
    #[case] expected: ValidationValue,
) {
    let opplasting = opplasting("0301", false, PdfInspection::Ok);

    let responses = opplasting
        .service
        .send_vedlegg("123", &metadata(filnavn), &filer(&data), &user())
        .await
        .expect("validation answer");

    assert_eq!(statuser(&responses), vec![expected, ValidationValue::Ok]);
    assert!(opplasting.sendt.lock().expect("lock").is_empty());
}

#[rstest]
#[case::encrypted(PdfInspection::Encrypted, ValidationValue::PdfIsEncrypted)]
#[case::unreadable(PdfInspection::Unreadable, ValidationValue::CouldNotLoadDocument)]
#[tokio::test]
async fn broken_pdf_is_rejected(
    #[case] inspection: PdfInspection,
    #[case] expected: ValidationValue,
) {
    let opplasting = opplasting("0301", false, inspection);

    let responses = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &filer(PNG), &user())
        .await
        .expect("validation answer");

    assert_eq!(statuser(&responses), vec![ValidationValue::Ok, expected]);
}

#[rstest]
#[tokio::test]
async fn jfif_part_is_an_illegal_file_type() {
    let opplasting = opplasting("0301", false, PdfInspection::Ok);
    let mut filer = filer(&[0xFF, 0xD8, 0xFF, 0xE0]);
    if let Some(fil) = filer.first_mut() {
        fil.filnavn = format!("{UUID_PNG}.jfif");
    }

    let responses = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.jpg"), &filer, &user())
        .await
        .expect("validation answer");

    assert_eq!(
        statuser(&responses),
        vec![ValidationValue::IllegalFileType, ValidationValue::Ok]
    );
}

#[rstest]
#[tokio::test]
async fn virus_aborts_with_an_error() {
    let opplasting = opplasting("0301", true, PdfInspection::Ok);

    let err = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &filer(PNG), &user())
        .await
        .expect_err("virus");

    assert_eq!(err.code(), ErrorCode::VirusFound);
    assert!(opplasting.sendt.lock().expect("lock").is_empty());
}

#[rstest]
#[tokio::test]
async fn metadata_without_matching_part_is_rejected() {
    let opplasting = opplasting("0301", false, PdfInspection::Ok);
    let mut filer = filer(PNG);
    filer.truncate(1);

    let err = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &filer, &user())
        .await
        .expect_err("missing part");

    assert_eq!(err.code(), ErrorCode::FilopplastingError);
}

#[rstest]
#[tokio::test]
async fn upload_without_files_is_rejected() {
    let opplasting = opplasting("0301", false, PdfInspection::Ok);

    let err = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &[], &user())
        .await
        .expect_err("no files");

    assert_eq!(err.code(), ErrorCode::FilopplastingError);
}

#[rstest]
#[tokio::test]
async fn kommune_without_ettersendelse_is_refused() {
    let opplasting = opplasting("1507", false, PdfInspection::Ok);

    let err = opplasting
        .service
        .send_vedlegg("123", &metadata("kontrakt.png"), &filer(PNG), &user())
        .await
        .expect_err("refused kommune");

    assert_eq!(err.code(), ErrorCode::UnexpectedError);
    assert!(opplasting.sendt.lock().expect("lock").is_empty());
}

#[rstest]
fn malformed_metadata_is_a_filopplasting_error() {
    let err = OpplastetVedleggMetadata::parse_liste(b"{\"type\":")
        .expect_err("malformed");
    assert_eq!(err.code(), ErrorCode::FilopplastingError);
}

fn sak_med_ettersendelser(original: bool, referanser: &[&str]) -> DigisosSak {
    let mut value = sak_json(SENDT);
    if !original {
        value["originalSoknadNAV"] = Value::Null;
    }
    let ettersendelser: Vec<Value> = referanser
        .iter()
        .map(|referanse| {
            json!({
                "navEksternRefId": referanse,
                "vedleggMetadata": "meta",
                "vedlegg": [],
                "timestampSendt": ETTERSENDT
            })
        })
        .collect();
    value["ettersendtInfoNAV"] = json!({ "ettersendelser": ettersendelser });
    sak(value)
}

#[rstest]
#[case::paper_soknad(false, &[], "1230001")]
#[case::first_ettersendelse(true, &[], "110000010001")]
#[case::highest_counter(true, &["110000010001", "110000010009", "110000010004"], "110000010010")]
fn nav_ekstern_ref_id_increments_the_highest_counter(
    #[case] original: bool,
    #[case] referanser: &[&str],
    #[case] expected: &str,
) {
    assert_eq!(
        lag_nav_ekstern_ref_id(&sak_med_ettersendelser(original, referanser)),
        expected
    );
}
