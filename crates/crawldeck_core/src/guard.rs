use crate::session::CredentialStore;

/// Top-level views of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Sign-in / sign-up entry view.
    #[default]
    Auth,
    Dashboard,
    NotFound,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Dashboard)
    }

    pub fn from_path(path: &str) -> Self {
        match path.trim().trim_end_matches('/') {
            "" | "/auth" => Route::Auth,
            "/dashboard" => Route::Dashboard,
            _ => Route::NotFound,
        }
    }
}

/// Resolves a navigation request. Protected routes only need a stored
/// credential here; its validity is checked where it is decoded.
pub fn admit(requested: Route, store: &dyn CredentialStore) -> Route {
    if requested.is_protected() && store.load().is_none() {
        Route::Auth
    } else {
        requested
    }
}
