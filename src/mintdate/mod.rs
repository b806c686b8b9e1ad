//! Mint-date discovery and reconciliation.
//!
//! Candidates come from three places, most trusted first: a transfer-events
//! API, a block-explorer transaction history, and date-like fields on the raw
//! record. The [`Reconciler`] validates each one and picks the first hit that
//! survives.

pub mod provider;
pub mod providers;
pub mod reconcile;
pub mod registry;

pub use provider::{CandidateSource, MintDateProvider};
pub use providers::{EventsApiProvider, ExplorerProvider};
pub use reconcile::{MintDateCandidate, MintDateQuery, Reconciler, Verdict};
pub use registry::MintDateRegistry;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Unix timestamps above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a date as found in indexer records and provider responses.
///
/// Accepts RFC 3339, naive date-times (taken as UTC), `YYYY-MM-DD`, and unix
/// timestamps in seconds or milliseconds.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return if n >= MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(n).single()
        } else {
            Utc.timestamp_opt(n, 0).single()
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}
