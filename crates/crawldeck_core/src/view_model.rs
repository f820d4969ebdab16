use crate::analytics::AnalyticsPanel;
use crate::forms::{AddUrlForm, FieldErrors};
use crate::guard::Route;
use crate::msg::AuthMode;
use crate::rows::{TrackedUrl, UrlId, UrlStatus};
use crate::state::{AppState, Notice};
use crate::sync::SyncPhase;
use crate::token::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityView {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// What the active auth form shows. Passwords are never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthFormView {
    pub mode: AuthMode,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub errors: FieldErrors,
    pub submitting: bool,
}

/// Which controls a row offers to the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowActions {
    pub can_start: bool,
    pub can_restart: bool,
    pub can_stop: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: UrlId,
    pub url: String,
    pub status: UrlStatus,
    pub last_updated: String,
    pub actions: RowActions,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub phase: SyncPhase,
    pub loading: bool,
    /// Last refresh failed; rows are from an earlier cycle.
    pub stale: bool,
    pub search: String,
    /// Rows matching the search, before pagination.
    pub matching_rows: usize,
    pub total_rows: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub auth: AuthFormView,
    pub identity: Option<IdentityView>,
    pub is_admin: bool,
    pub table: TableView,
    pub pending_delete: Option<UrlId>,
    pub add_url: AddUrlForm,
    pub analytics: Option<AnalyticsPanel>,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let identity = self.identity();
        let is_admin = identity.is_some_and(|identity| identity.is_admin());

        AppViewModel {
            route: self.route,
            auth: self.auth_form_view(),
            identity: identity.map(|identity| IdentityView {
                name: identity.display_name(),
                email: identity.email.clone(),
                role: identity.role,
            }),
            is_admin,
            table: self.table_view(is_admin),
            pending_delete: self.pending_delete,
            add_url: self.add_url.clone(),
            analytics: self.analytics.clone(),
            notices: self.notices.clone(),
            dirty: self.is_dirty(),
        }
    }

    /// The search projection of the current row set.
    pub fn filtered_rows(&self) -> Vec<TrackedUrl> {
        self.search_filter.apply(self.table.rows(), &self.search)
    }

    fn auth_form_view(&self) -> AuthFormView {
        match self.auth_mode {
            AuthMode::SignIn => AuthFormView {
                mode: AuthMode::SignIn,
                email: self.sign_in.email.clone(),
                errors: self.sign_in.errors.clone(),
                submitting: self.sign_in.submitting,
                ..AuthFormView::default()
            },
            AuthMode::SignUp => AuthFormView {
                mode: AuthMode::SignUp,
                first_name: self.sign_up.first_name.clone(),
                last_name: self.sign_up.last_name.clone(),
                email: self.sign_up.email.clone(),
                errors: self.sign_up.errors.clone(),
                submitting: self.sign_up.submitting,
            },
        }
    }

    fn table_view(&self, is_admin: bool) -> TableView {
        let filtered = self.filtered_rows();
        let pagination = self.pagination;
        let page = pagination.effective_page(filtered.len());
        let rows = filtered
            .iter()
            .skip(page * pagination.page_size)
            .take(pagination.page_size)
            .map(|row| RowView {
                id: row.id,
                url: row.url.clone(),
                status: row.status.clone(),
                last_updated: row.last_updated_label(),
                actions: row_actions(&row.status, is_admin),
            })
            .collect();

        TableView {
            phase: self.table.phase(),
            loading: self.table.is_fetching(),
            stale: self.table.phase() == SyncPhase::Failed,
            search: self.search.clone(),
            matching_rows: filtered.len(),
            total_rows: self.table.rows().len(),
            page,
            page_count: pagination.page_count(filtered.len()),
            page_size: pagination.page_size,
            rows,
        }
    }
}

fn row_actions(status: &UrlStatus, is_admin: bool) -> RowActions {
    if !is_admin {
        return RowActions::default();
    }
    RowActions {
        can_start: *status == UrlStatus::Queued,
        can_restart: matches!(status, UrlStatus::Done | UrlStatus::Error),
        can_stop: *status == UrlStatus::Processing,
        can_delete: true,
    }
}
