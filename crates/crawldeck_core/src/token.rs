//! Bearer token decoding.
//!
//! The console never verifies signatures; the backend does. Decoding only
//! extracts identity claims and rejects anything malformed or expired.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Claims carried by a valid, unexpired credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<i64>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<i64>,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decodes `token` against the current clock.
pub fn decode(token: Option<&str>) -> Option<Identity> {
    decode_at(token, Utc::now())
}

/// Decodes `token` as of `now`. Returns `None` for a missing, malformed or
/// expired token; never panics.
pub fn decode_at(token: Option<&str>, now: DateTime<Utc>) -> Option<Identity> {
    let token = token?.trim();
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    let role = Role::parse(&claims.role)?;

    // An `exp` beyond what chrono can represent is far past or far future;
    // only the past one has expired.
    let expires_at = match claims.exp.map(|exp| (exp, Utc.timestamp_opt(exp, 0).single())) {
        Some((_, Some(expires_at))) if now >= expires_at => return None,
        Some((_, Some(expires_at))) => Some(expires_at),
        Some((exp, None)) if exp < 0 => return None,
        Some((_, None)) | None => None,
    };

    Some(Identity {
        user_id: claims.user_id,
        email: claims.email,
        first_name: claims.first_name,
        last_name: claims.last_name,
        role,
        expires_at,
    })
}
