use std::time::Duration;

use crate::analytics::{AnalyticsPanel, PanelKey};
use crate::filter::{SearchFilter, DEFAULT_THRESHOLD};
use crate::forms::{AddUrlForm, SignInForm, SignUpForm};
use crate::guard::Route;
use crate::msg::AuthMode;
use crate::rows::UrlId;
use crate::session::SessionSnapshot;
use crate::sync::{TableSync, DEFAULT_POLL_INTERVAL};
use crate::token::Identity;

pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 20, 50];
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Tunables supplied by the host at start-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsoleSettings {
    pub poll_interval: Duration,
    pub page_size: usize,
    pub search_threshold: f64,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            search_threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    /// How long a notice of this level stays up before it hides itself.
    pub fn lifetime(self) -> Duration {
        match self {
            NoticeLevel::Success => Duration::from_secs(3),
            NoticeLevel::Error => Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    remaining: Duration,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            remaining: level.lifetime(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    /// Ages the notice by `elapsed`; returns `false` once it has run out.
    pub(crate) fn age(&mut self, elapsed: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(elapsed);
        !self.remaining.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        let page_size = if PAGE_SIZE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self { page: 0, page_size }
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Current page, clamped to what `total` rows can fill.
    pub fn effective_page(&self, total: usize) -> usize {
        self.page.min(self.page_count(total) - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) route: Route,
    pub(crate) auth_mode: AuthMode,
    pub(crate) sign_in: SignInForm,
    pub(crate) sign_up: SignUpForm,
    pub(crate) session: SessionSnapshot,
    pub(crate) table: TableSync,
    pub(crate) poll_interval: Duration,
    pub(crate) search: String,
    pub(crate) search_filter: SearchFilter,
    pub(crate) pagination: Pagination,
    pub(crate) pending_delete: Option<UrlId>,
    pub(crate) add_url: AddUrlForm,
    pub(crate) analytics: Option<AnalyticsPanel>,
    pub(crate) panels_opened: u64,
    pub(crate) notices: Vec<Notice>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(ConsoleSettings::default())
    }

    pub fn with_settings(settings: ConsoleSettings) -> Self {
        Self {
            route: Route::Auth,
            auth_mode: AuthMode::SignIn,
            sign_in: SignInForm::default(),
            sign_up: SignUpForm::default(),
            session: SessionSnapshot::default(),
            table: TableSync::new(),
            poll_interval: settings.poll_interval,
            search: String::new(),
            search_filter: SearchFilter::with_threshold(settings.search_threshold),
            pagination: Pagination::new(settings.page_size),
            pending_delete: None,
            add_url: AddUrlForm::default(),
            analytics: None,
            panels_opened: 0,
            notices: Vec::new(),
            dirty: false,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> &SessionSnapshot {
        &self.session
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity.as_ref()
    }

    pub fn table(&self) -> &TableSync {
        &self.table
    }

    pub fn analytics(&self) -> Option<&AnalyticsPanel> {
        self.analytics.as_ref()
    }

    pub fn pending_delete(&self) -> Option<UrlId> {
        self.pending_delete
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn next_panel_key(&mut self, url_id: UrlId) -> PanelKey {
        self.panels_opened += 1;
        PanelKey {
            url_id,
            opened: self.panels_opened,
        }
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drops notices whose lifetime ran out during the last tick.
    pub(crate) fn expire_notices(&mut self, elapsed: Duration) {
        let before = self.notices.len();
        self.notices.retain_mut(|notice| notice.age(elapsed));
        if self.notices.len() != before {
            self.mark_dirty();
        }
    }
}
