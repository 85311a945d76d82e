//! Small helpers shared by the event fold and the services.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Europe::Oslo;
use mockable::Clock;
use regex::Regex;
use sha2::{Digest, Sha256, Sha512};

use super::digisos::JsonFilreferanse;

static FNR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{11}\b").ok());

/// Replace anything that looks like a fødselsnummer with `[FNR]`.
///
/// # Examples
/// ```
/// use innsyn_api::domain::support::mask_fnr;
///
/// assert_eq!(mask_fnr("bruker 12345678910 finnes ikke"), "bruker [FNR] finnes ikke");
/// ```
pub fn mask_fnr(text: &str) -> String {
    match FNR_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(text, "[FNR]").into_owned(),
        None => text.to_owned(),
    }
}

/// Lowercase hex SHA-256 of the input.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Lowercase hex SHA-512 of raw bytes.
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

/// Parse an ISO-8601 timestamp and express it in Norwegian local time.
///
/// Timestamps without offset are taken as already local.
pub fn to_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Oslo).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Convert epoch milliseconds to Norwegian local time.
pub fn unix_to_local_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Oslo).naive_local())
}

/// Current Norwegian local time according to the injected clock.
pub fn now_local(clock: &dyn Clock) -> NaiveDateTime {
    clock.utc().with_timezone(&Oslo).naive_local()
}

/// Drop the " kommune" suffix Fiks appends to NAV office names.
pub fn strip_enhetsnavn_for_kommune(navn: &str) -> String {
    navn.replace(" kommune", "")
}

/// Norwegian month name in lowercase, `None` outside 1..=12.
pub fn norsk_maanedsnavn(month: u32) -> Option<&'static str> {
    const NAVN: [&str; 12] = [
        "januar", "februar", "mars", "april", "mai", "juni", "juli", "august", "september",
        "oktober", "november", "desember",
    ];
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    NAVN.get(index).copied()
}

/// Long Norwegian rendering such as `5. mars 2024 kl. 13.05`.
pub fn format_local_datetime(tidspunkt: NaiveDateTime) -> String {
    let maaned = norsk_maanedsnavn(tidspunkt.month()).unwrap_or_default();
    format!(
        "{}. {maaned} {} kl. {}",
        tidspunkt.day(),
        tidspunkt.year(),
        tidspunkt.format("%H.%M")
    )
}

/// Base URLs used to build links to letters stored outside innsyn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DokumentUrls {
    pub dokumentlager: String,
    pub svarut: String,
}

impl DokumentUrls {
    /// Direct link to a dokumentlager document.
    pub fn dokumentlager_url(&self, dokumentlager_id: &str) -> String {
        format!(
            "{}/dokumentlager/nedlasting/niva4/{dokumentlager_id}?inline=true",
            self.dokumentlager.trim_end_matches('/')
        )
    }

    /// Link for a letter reference in a hendelse.
    pub fn url_for(&self, referanse: &JsonFilreferanse) -> String {
        match referanse {
            JsonFilreferanse::Dokumentlager { id } => self.dokumentlager_url(id),
            JsonFilreferanse::SvarUt { id, nr } => format!(
                "{}/forsendelse/{id}/{nr}?inline=true",
                self.svarut.trim_end_matches('/')
            ),
        }
    }
}
