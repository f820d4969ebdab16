use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Correlates a call submitted to the engine with its reply.
pub type CallId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// The backend answered with a non-success status.
    HttpStatus(u16),
    Timeout,
    /// No response was received.
    Network,
    /// A response arrived but its body was not what the endpoint promises.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Status code for `HttpStatus` failures.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }

    /// Server-supplied explanation, when the error body carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self.kind {
            FailureKind::HttpStatus(_) if !self.message.is_empty() => Some(&self.message),
            _ => None,
        }
    }
}

/// One backend operation, as submitted to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Login {
        email: String,
        password: String,
    },
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },
    ListUrls,
    AddUrl {
        url: String,
    },
    DeleteUrl {
        id: u64,
    },
    StartUrls {
        ids: Vec<u64>,
    },
    StopUrls {
        ids: Vec<u64>,
    },
    LinkCount {
        id: u64,
    },
    BrokenLinks {
        id: u64,
    },
}

impl ApiCall {
    /// Name for logs; never includes credentials.
    pub fn name(&self) -> &'static str {
        match self {
            ApiCall::Login { .. } => "login",
            ApiCall::Register { .. } => "register",
            ApiCall::ListUrls => "list_urls",
            ApiCall::AddUrl { .. } => "add_url",
            ApiCall::DeleteUrl { .. } => "delete_url",
            ApiCall::StartUrls { .. } => "start_urls",
            ApiCall::StopUrls { .. } => "stop_urls",
            ApiCall::LinkCount { .. } => "link_count",
            ApiCall::BrokenLinks { .. } => "broken_links",
        }
    }
}

/// A row of `GET /urls`. The backend uses capitalized keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlRecord {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LinkCountRecord {
    pub internal: u64,
    pub external: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokenLinkRecord {
    pub href: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply {
    Token(Result<String, ApiError>),
    Urls(Result<Vec<UrlRecord>, ApiError>),
    /// Commands whose response body is ignored.
    Ack(Result<(), ApiError>),
    LinkCount(Result<LinkCountRecord, ApiError>),
    BrokenLinks(Result<Vec<BrokenLinkRecord>, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Completed { call_id: CallId, reply: ApiReply },
    PollTick,
}
