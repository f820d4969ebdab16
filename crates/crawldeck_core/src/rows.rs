use std::fmt;

use chrono::{DateTime, Utc};

/// Stable backend identifier of a tracked URL.
pub type UrlId = u64;

/// Crawl status of a tracked URL as shown in the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    Queued,
    Processing,
    Done,
    Error,
    Stopped,
    /// Backend sent a status this console does not know; carries the display label.
    Unknown(String),
}

impl UrlStatus {
    /// Maps a raw backend status (`queued`, `PROCESSING`, ...) to a status.
    pub fn from_raw(raw: &str) -> Self {
        let label = capitalize_status(raw);
        match label.as_str() {
            "Queued" => UrlStatus::Queued,
            "Processing" => UrlStatus::Processing,
            "Done" => UrlStatus::Done,
            "Error" => UrlStatus::Error,
            "Stopped" => UrlStatus::Stopped,
            _ => UrlStatus::Unknown(label),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UrlStatus::Queued => "Queued",
            UrlStatus::Processing => "Processing",
            UrlStatus::Done => "Done",
            UrlStatus::Error => "Error",
            UrlStatus::Stopped => "Stopped",
            UrlStatus::Unknown(label) => label,
        }
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize_status(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// One row of the tracked-URL table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedUrl {
    pub id: UrlId,
    pub url: String,
    pub status: UrlStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

impl TrackedUrl {
    /// Builds a row from the backend's wire fields.
    pub fn from_wire(id: UrlId, url: String, raw_status: &str, updated_at: &str) -> Self {
        Self {
            id,
            url,
            status: UrlStatus::from_raw(raw_status),
            last_updated: parse_timestamp(updated_at),
        }
    }

    /// Display form of `last_updated`; also the text the search filter matches.
    pub fn last_updated_label(&self) -> String {
        format_timestamp(self.last_updated)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Link-type counts for one crawled page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStats {
    pub internal: u64,
    pub external: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub href: String,
    pub status_code: u16,
}
