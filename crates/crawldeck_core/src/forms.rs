//! Sign-in / sign-up / add-URL form state, validation and failure messages.

use std::sync::OnceLock;

use regex::Regex;

use crate::failure::RequestFailure;

pub const INVALID_EMAIL: &str = "Please enter a valid email address.";
pub const MISSING_PASSWORD: &str = "Please enter your password.";
pub const MISSING_NAME: &str = "First and last name are required.";
pub const INVALID_NAME: &str = "Names must contain only letters.";
pub const WEAK_PASSWORD: &str = "Password must be at least 8 characters long and include uppercase, lowercase, number, and special character.";
pub const INCORRECT_CREDENTIALS: &str = "Email or password is incorrect.";
pub const NETWORK_ERROR: &str = "Network error, please check your connection and try again.";
pub const SERVER_ERROR: &str = "Server error, please try again later.";
pub const EMAIL_IN_USE: &str = "This email is already in use.";
pub const SIGNUP_FAILED: &str = "Something went wrong. Please try again later.";
pub const INVALID_URL: &str = "Please enter a valid URL.";
pub const URL_ALREADY_TRACKED: &str = "This URL is already being tracked.";

const PASSWORD_SPECIALS: &str = r#"!@#~$%^&*()_+{}[]:;"'<>,.?/\|`-"#;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]+(?: [A-Za-z]+)*$").expect("name pattern"))
}

/// Inline messages keyed by field. `general` is shown under the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub general: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.general.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub errors: FieldErrors,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub errors: FieldErrors,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddUrlForm {
    pub open: bool,
    pub input: String,
    pub error: Option<String>,
    pub submitting: bool,
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn validate_sign_in(form: &SignInForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if form.email.is_empty() || !is_valid_email(&form.email) {
        errors.email = Some(INVALID_EMAIL.to_string());
    }
    if form.password.is_empty() {
        errors.password = Some(MISSING_PASSWORD.to_string());
    }
    errors
}

pub fn validate_sign_up(form: &SignUpForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    let (first, last) = (form.first_name.trim(), form.last_name.trim());
    if first.is_empty() || last.is_empty() {
        errors.name = Some(MISSING_NAME.to_string());
    } else if !name_pattern().is_match(first) || !name_pattern().is_match(last) {
        errors.name = Some(INVALID_NAME.to_string());
    }
    if form.email.trim().is_empty() || !is_valid_email(&form.email) {
        errors.email = Some(INVALID_EMAIL.to_string());
    }
    if !is_strong_password(&form.password) {
        errors.password = Some(WEAK_PASSWORD.to_string());
    }
    errors
}

/// Login failures mark both fields; the backend does not say which was wrong.
/// A rejection carries the backend's own message when it sent one.
pub fn sign_in_failure(failure: &RequestFailure) -> FieldErrors {
    let message = match failure {
        RequestFailure::Network => NETWORK_ERROR.to_string(),
        RequestFailure::Status {
            message: Some(message),
            ..
        } if failure.is_auth_rejection() && !message.trim().is_empty() => message.clone(),
        f if f.is_auth_rejection() => INCORRECT_CREDENTIALS.to_string(),
        _ => SERVER_ERROR.to_string(),
    };
    FieldErrors {
        email: Some(message.clone()),
        password: Some(message),
        ..FieldErrors::default()
    }
}

pub fn sign_up_failure(failure: &RequestFailure) -> FieldErrors {
    match failure {
        f if f.is_conflict() => FieldErrors {
            email: Some(EMAIL_IN_USE.to_string()),
            ..FieldErrors::default()
        },
        RequestFailure::Network => FieldErrors {
            general: Some(NETWORK_ERROR.to_string()),
            ..FieldErrors::default()
        },
        _ => FieldErrors {
            general: Some(SIGNUP_FAILED.to_string()),
            ..FieldErrors::default()
        },
    }
}
