#![allow(dead_code)]

use std::sync::Once;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use crawldeck_core::{
    update, AppState, Effect, FetchTicket, Identity, Msg, Role, SessionSnapshot, TrackedUrl,
    UrlStatus,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawldeck_logging::initialize_for_tests);
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Builds an unsigned JWT-shaped token around `payload`.
pub fn token_with_payload(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

pub fn token(role: &str, exp: Option<i64>) -> String {
    let mut payload = serde_json::json!({
        "user_id": 7,
        "email": "ops@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": role,
    });
    if let Some(exp) = exp {
        payload["exp"] = serde_json::json!(exp);
    }
    token_with_payload(&payload)
}

/// A token valid for a day from the real clock.
pub fn fresh_token(role: &str) -> String {
    token(role, Some(Utc::now().timestamp() + 86_400))
}

pub fn identity(role: Role) -> Identity {
    Identity {
        user_id: Some(7),
        email: "ops@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        role,
        expires_at: None,
    }
}

pub fn row(id: u64, status: UrlStatus) -> TrackedUrl {
    TrackedUrl {
        id,
        url: format!("https://site{id}.example.org/"),
        status,
        last_updated: Some(at(1_714_560_000 + id as i64)),
    }
}

/// State signed in as `role`, on the dashboard, with the mount fetch still in flight.
pub fn signed_in(role: Role) -> (AppState, FetchTicket) {
    let snapshot = SessionSnapshot {
        credential: Some("stored-token".to_string()),
        identity: Some(identity(role)),
    };
    let (state, effects) = update(AppState::new(), Msg::SessionChanged(snapshot));
    let ticket = fetch_ticket(&effects).expect("mount fetch");
    (state, ticket)
}

/// Signed in as `role` with `rows` already settled in the table.
pub fn with_rows(role: Role, rows: Vec<TrackedUrl>) -> AppState {
    let (state, ticket) = signed_in(role);
    let (state, effects) = update(
        state,
        Msg::RowsFetched {
            ticket,
            result: Ok(rows),
        },
    );
    assert!(effects.is_empty());
    state
}

pub fn fetch_ticket(effects: &[Effect]) -> Option<FetchTicket> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchRows { ticket } => Some(*ticket),
        _ => None,
    })
}

pub fn fetch_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::FetchRows { .. }))
        .count()
}
