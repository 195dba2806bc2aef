// News event domain model and timestamp normalization
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label used when an event carries neither a title nor a url.
pub const DEFAULT_LABEL: &str = "News Event";

// Compact form used by the news API, e.g. "20250107T153000Z".
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";
// Zone-less ISO form; UTC is attached.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
#[error("unparseable event timestamp '{raw}'")]
pub struct EventTimeError {
    pub raw: String,
}

/// A timestamped, subject-tagged occurrence to overlay against a price
/// series. `seen_at` keeps the source's raw timestamp string; alignment
/// normalizes it to UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEvent {
    pub seen_at: String,
    pub subject: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub source_domain: Option<String>,
}

impl NewsEvent {
    /// Coerce the raw timestamp onto the absolute UTC timeline. Accepts the
    /// news API's compact form, RFC 3339 (converted from its offset), and the
    /// bare ISO form (UTC attached when no zone is present).
    pub fn normalized_time(&self) -> Result<DateTime<Utc>, EventTimeError> {
        let raw = self.seen_at.trim();

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, COMPACT_FORMAT) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Ok(with_offset.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT) {
            return Ok(Utc.from_utc_datetime(&naive));
        }

        Err(EventTimeError {
            raw: raw.to_string(),
        })
    }

    /// Marker label, falling back title -> url -> a fixed default. Never fails.
    pub fn label(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.url.as_deref().filter(|u| !u.is_empty()))
            .unwrap_or(DEFAULT_LABEL)
            .to_string()
    }
}
