use std::fmt;

/// Why a backend request did not succeed, as far as the console cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// No response was received.
    Network,
    /// The backend answered with a non-success status.
    Status { code: u16, message: Option<String> },
    /// The backend answered but the body could not be understood.
    Malformed,
}

impl RequestFailure {
    pub fn status(code: u16) -> Self {
        RequestFailure::Status {
            code,
            message: None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RequestFailure::Status { code: 409, .. })
    }

    /// 400/401 on login: the backend does not say which field was wrong.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, RequestFailure::Status { code: 400 | 401, .. })
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Network => write!(f, "network error"),
            RequestFailure::Status {
                message: Some(message),
                ..
            } => write!(f, "{message}"),
            RequestFailure::Status { code, .. } => write!(f, "request failed with status {code}"),
            RequestFailure::Malformed => write!(f, "unexpected response from server"),
        }
    }
}
