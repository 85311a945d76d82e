//! Shared reqwest plumbing for the upstream adapters.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::warn;

use crate::domain::support::mask_fnr;
use crate::domain::{CALL_ID_HEADER, CallId, Token};

/// Build a client with a request timeout.
///
/// # Errors
///
/// Returns an error when the reqwest client cannot be constructed.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// `Authorization` header value for a token.
pub(crate) fn bearer(token: &Token) -> String {
    format!("Bearer {}", token.as_str())
}

/// Forward the current request's call id, when one is bound.
pub(crate) fn with_call_id(builder: RequestBuilder) -> RequestBuilder {
    match CallId::current() {
        Some(call_id) => builder.header(CALL_ID_HEADER, call_id.as_str()),
        None => builder,
    }
}

/// Single-line excerpt of an upstream body, fødselsnummer masked.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let masked = mask_fnr(&compact);
    let preview = masked.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if masked.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// `status 503: <preview>` or `status 503` when there is no body.
pub(crate) fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

/// Attempts and base delay for retried reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`, doubling each time.
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }

    /// Run `call` until it succeeds, `retryable` rejects the error, or the
    /// attempts are spent.
    pub(crate) async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        retryable: impl Fn(&E) -> bool,
        mut call: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && retryable(&err) => {
                    warn!(operation, attempt, error = %err, "kall feilet, prøver igjen");
                    tokio::time::sleep(self.delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn preview_compacts_whitespace_and_masks_fnr() {
        let preview = body_preview(b"{\n  \"melding\": \"fant ikke 12345678901\"\n}");
        assert_eq!(preview, "{ \"melding\": \"fant ikke [FNR]\" }");
    }

    #[rstest]
    fn preview_is_truncated() {
        let body = "a".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    #[case::with_body(b"nede".as_slice(), "status 503: nede")]
    #[case::empty(b"".as_slice(), "status 503")]
    fn status_message_includes_preview(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(status_message(StatusCode::SERVICE_UNAVAILABLE, body), expected);
    }

    #[rstest]
    #[case(1, 100)]
    #[case(2, 200)]
    #[case(3, 400)]
    fn delay_doubles(#[case] attempt: u32, #[case] millis: u64) {
        assert_eq!(
            RetryPolicy::default().delay(attempt),
            Duration::from_millis(millis)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn retries_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
        };
        let result: Result<u32, String> = policy
            .run("test", |_| true, || {
                calls.set(calls.get() + 1);
                let current = calls.get();
                async move {
                    if current < 3 {
                        Err(format!("feil {current}"))
                    } else {
                        Ok(current)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(3));
    }

    #[rstest]
    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let calls = Cell::new(0);
        let result: Result<(), String> = RetryPolicy::default()
            .run("test", |_| false, || {
                calls.set(calls.get() + 1);
                async { Err("404".to_owned()) }
            })
            .await;
        assert_eq!(result, Err("404".to_owned()));
        assert_eq!(calls.get(), 1);
    }
}
