//! Role-gated state-transition commands.
//!
//! Every command is checked here before any request leaves the console.
//! Authorization does not touch row state; the table only changes after the
//! next synchronizer cycle.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::rows::{TrackedUrl, UrlId, UrlStatus};
use crate::token::Identity;

/// A backend command that passed authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start queued rows or restart finished ones; the backend treats both alike.
    Start { ids: Vec<UrlId> },
    Stop { ids: Vec<UrlId> },
    Delete { id: UrlId },
    Create { url: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
            Command::Delete { .. } => "delete",
            Command::Create { .. } => "create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// Caller is not an admin (or not signed in).
    NotPermitted,
    NoTargets,
    UnknownRow(UrlId),
    InvalidStatus { id: UrlId, status: UrlStatus },
    InvalidUrl,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::NotPermitted => write!(f, "only admins can change tracked URLs"),
            Refusal::NoTargets => write!(f, "no rows selected"),
            Refusal::UnknownRow(id) => write!(f, "no tracked URL with id {id}"),
            Refusal::InvalidStatus { id, status } => {
                write!(f, "URL {id} cannot do that while {status}")
            }
            Refusal::InvalidUrl => write!(f, "Please enter a valid URL."),
        }
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https?://)?([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(/.*)?$").expect("url pattern")
    })
}

/// Absolute (`https://host.tld/...`) or scheme-less (`host.tld/...`) URL with a hostname.
pub fn is_valid_url(input: &str) -> bool {
    url_pattern().is_match(input)
}

fn require_admin(identity: Option<&Identity>) -> Result<(), Refusal> {
    match identity {
        Some(identity) if identity.is_admin() => Ok(()),
        _ => Err(Refusal::NotPermitted),
    }
}

fn check_rows(
    rows: &[TrackedUrl],
    ids: &[UrlId],
    allowed: impl Fn(&UrlStatus) -> bool,
) -> Result<Vec<UrlId>, Refusal> {
    if ids.is_empty() {
        return Err(Refusal::NoTargets);
    }
    let mut checked = Vec::with_capacity(ids.len());
    for &id in ids {
        let row = rows
            .iter()
            .find(|row| row.id == id)
            .ok_or(Refusal::UnknownRow(id))?;
        if !allowed(&row.status) {
            return Err(Refusal::InvalidStatus {
                id,
                status: row.status.clone(),
            });
        }
        if !checked.contains(&id) {
            checked.push(id);
        }
    }
    Ok(checked)
}

/// Start (`Queued`) or restart (`Done`/`Error`) the given rows.
pub fn authorize_start(
    identity: Option<&Identity>,
    rows: &[TrackedUrl],
    ids: &[UrlId],
) -> Result<Command, Refusal> {
    require_admin(identity)?;
    let ids = check_rows(rows, ids, |status| {
        matches!(status, UrlStatus::Queued | UrlStatus::Done | UrlStatus::Error)
    })?;
    Ok(Command::Start { ids })
}

pub fn authorize_stop(
    identity: Option<&Identity>,
    rows: &[TrackedUrl],
    ids: &[UrlId],
) -> Result<Command, Refusal> {
    require_admin(identity)?;
    let ids = check_rows(rows, ids, |status| *status == UrlStatus::Processing)?;
    Ok(Command::Stop { ids })
}

pub fn authorize_delete(
    identity: Option<&Identity>,
    rows: &[TrackedUrl],
    id: UrlId,
) -> Result<Command, Refusal> {
    require_admin(identity)?;
    check_rows(rows, &[id], |_| true)?;
    Ok(Command::Delete { id })
}

pub fn authorize_create(identity: Option<&Identity>, input: &str) -> Result<Command, Refusal> {
    require_admin(identity)?;
    let url = input.trim();
    if !is_valid_url(url) {
        return Err(Refusal::InvalidUrl);
    }
    Ok(Command::Create {
        url: url.to_string(),
    })
}
