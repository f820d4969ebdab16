mod common;

use common::{identity, init_logging, signed_in};
use crawldeck_core::forms::{
    EMAIL_IN_USE, INCORRECT_CREDENTIALS, INVALID_EMAIL, MISSING_PASSWORD, NETWORK_ERROR,
    SIGNUP_FAILED, WEAK_PASSWORD,
};
use crawldeck_core::{
    update, AppState, AuthMode, Effect, FormField, Msg, RequestFailure, Role, Route,
    SessionSnapshot,
};
use pretty_assertions::assert_eq;

fn field(field: FormField, value: &str) -> Msg {
    Msg::AuthFieldChanged {
        field,
        value: value.to_string(),
    }
}

fn filled_sign_in() -> AppState {
    let (state, _) = update(AppState::new(), field(FormField::Email, "ops@example.com"));
    let (state, _) = update(state, field(FormField::Password, "hunter2"));
    state
}

fn filled_sign_up() -> AppState {
    let (state, _) = update(AppState::new(), Msg::AuthModeSelected(AuthMode::SignUp));
    let (state, _) = update(state, field(FormField::FirstName, "Ada"));
    let (state, _) = update(state, field(FormField::LastName, "Lovelace"));
    let (state, _) = update(state, field(FormField::Email, "ada@example.com"));
    let (state, _) = update(state, field(FormField::Password, "Engine#1843"));
    state
}

#[test]
fn sign_in_validation_blocks_the_request() {
    init_logging();
    let (state, _) = update(AppState::new(), field(FormField::Email, "not-an-email"));
    let (state, effects) = update(state, Msg::AuthSubmitted);
    assert!(effects.is_empty());
    let errors = state.view().auth.errors;
    assert_eq!(errors.email.as_deref(), Some(INVALID_EMAIL));
    assert_eq!(errors.password.as_deref(), Some(MISSING_PASSWORD));
}

#[test]
fn sign_in_submits_trimmed_email_once() {
    init_logging();
    let (state, _) = update(filled_sign_in(), field(FormField::Email, " ops@example.com "));
    let (state, effects) = update(state, Msg::AuthSubmitted);
    assert_eq!(
        effects,
        vec![Effect::Authenticate {
            email: "ops@example.com".to_string(),
            password: "hunter2".to_string(),
        }]
    );
    assert!(state.view().auth.submitting);

    let (_, effects) = update(state, Msg::AuthSubmitted);
    assert!(effects.is_empty());
}

#[test]
fn rejected_login_marks_both_fields_and_stores_nothing() {
    init_logging();
    let (state, _) = update(filled_sign_in(), Msg::AuthSubmitted);
    let (state, effects) = update(state, Msg::LoginReplied(Err(RequestFailure::status(401))));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.route, Route::Auth);
    assert!(!view.auth.submitting);
    assert_eq!(view.auth.errors.email.as_deref(), Some(INCORRECT_CREDENTIALS));
    assert_eq!(view.auth.errors.password.as_deref(), Some(INCORRECT_CREDENTIALS));
    assert!(state.session().credential.is_none());
}

#[test]
fn rejected_login_prefers_the_backend_message() {
    init_logging();
    let (state, _) = update(filled_sign_in(), Msg::AuthSubmitted);
    let failure = RequestFailure::Status {
        code: 401,
        message: Some("Account is locked".to_string()),
    };
    let (state, _) = update(state, Msg::LoginReplied(Err(failure)));
    let view = state.view();
    assert_eq!(view.auth.errors.email.as_deref(), Some("Account is locked"));
    assert_eq!(view.auth.errors.password.as_deref(), Some("Account is locked"));

    let (state, _) = update(state, Msg::AuthSubmitted);
    let blank = RequestFailure::Status {
        code: 400,
        message: Some("  ".to_string()),
    };
    let (state, _) = update(state, Msg::LoginReplied(Err(blank)));
    assert_eq!(state.view().auth.errors.email.as_deref(), Some(INCORRECT_CREDENTIALS));
}

#[test]
fn login_network_failure_is_reported() {
    init_logging();
    let (state, _) = update(filled_sign_in(), Msg::AuthSubmitted);
    let (state, _) = update(state, Msg::LoginReplied(Err(RequestFailure::Network)));
    assert_eq!(state.view().auth.errors.email.as_deref(), Some(NETWORK_ERROR));
}

#[test]
fn accepted_login_hands_token_to_session() {
    init_logging();
    let (state, _) = update(filled_sign_in(), Msg::AuthSubmitted);
    let (_, effects) = update(state, Msg::LoginReplied(Ok("tok".to_string())));
    assert_eq!(
        effects,
        vec![Effect::EstablishSession {
            token: "tok".to_string()
        }]
    );
}

#[test]
fn sign_up_requires_strong_password() {
    init_logging();
    let (state, _) = update(filled_sign_up(), field(FormField::Password, "password"));
    let (state, effects) = update(state, Msg::AuthSubmitted);
    assert!(effects.is_empty());
    assert_eq!(state.view().auth.errors.password.as_deref(), Some(WEAK_PASSWORD));
}

#[test]
fn sign_up_submits_register() {
    init_logging();
    let (_, effects) = update(filled_sign_up(), Msg::AuthSubmitted);
    assert_eq!(
        effects,
        vec![Effect::Register {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "Engine#1843".to_string(),
        }]
    );
}

#[test]
fn sign_up_failures_map_to_messages() {
    init_logging();
    let cases = [
        (RequestFailure::status(409), Some(EMAIL_IN_USE), None),
        (RequestFailure::Network, None, Some(NETWORK_ERROR)),
        (RequestFailure::status(500), None, Some(SIGNUP_FAILED)),
    ];
    for (failure, email, general) in cases {
        let (state, _) = update(filled_sign_up(), Msg::AuthSubmitted);
        let (state, effects) = update(state, Msg::RegisterReplied(Err(failure)));
        assert!(effects.is_empty());
        let errors = state.view().auth.errors;
        assert_eq!(errors.email.as_deref(), email);
        assert_eq!(errors.general.as_deref(), general);
    }
}

#[test]
fn password_is_never_exposed_in_the_view() {
    init_logging();
    let rendered = format!("{:?}", filled_sign_in().view());
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn session_without_identity_stays_on_auth() {
    init_logging();
    let snapshot = SessionSnapshot {
        credential: Some("garbage".to_string()),
        identity: None,
    };
    let (state, effects) = update(AppState::new(), Msg::SessionChanged(snapshot));
    assert!(effects.is_empty());
    assert_eq!(state.route(), Route::Auth);
}

#[test]
fn logout_ends_session_then_returns_to_auth() {
    init_logging();
    let (state, _) = signed_in(Role::User);
    assert_eq!(state.view().identity.unwrap().name, identity(Role::User).display_name());

    let (state, effects) = update(state, Msg::LogoutClicked);
    assert_eq!(effects, vec![Effect::EndSession]);

    let (state, effects) = update(state, Msg::SessionChanged(SessionSnapshot::default()));
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.route(), Route::Auth);
    assert!(state.view().identity.is_none());

    let (_, effects) = update(state, Msg::LogoutClicked);
    assert!(effects.is_empty());
}

#[test]
fn unknown_route_unmounts_the_table() {
    init_logging();
    let (state, _) = signed_in(Role::Admin);
    let (state, effects) = update(state, Msg::Navigate(Route::NotFound));
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.route(), Route::NotFound);
}
