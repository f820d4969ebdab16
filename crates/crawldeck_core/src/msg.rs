use std::time::Duration;

use crate::analytics::PanelKey;
use crate::dispatch::Command;
use crate::failure::RequestFailure;
use crate::guard::Route;
use crate::rows::{BrokenLink, LinkStats, TrackedUrl, UrlId};
use crate::session::SessionSnapshot;
use crate::sync::FetchTicket;

/// Period of `Msg::Tick`; the host's ticker sends one per interval.
pub const TICK_INTERVAL: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Navigation request, already resolved by the route guard.
    Navigate(Route),
    /// User switched between the sign-in and sign-up forms.
    AuthModeSelected(AuthMode),
    /// User edited a field of the active auth form.
    AuthFieldChanged { field: FormField, value: String },
    /// User submitted the active auth form.
    AuthSubmitted,
    /// Backend answered `POST /login`.
    LoginReplied(Result<String, RequestFailure>),
    /// Backend answered `POST /register`.
    RegisterReplied(Result<String, RequestFailure>),
    /// Session store finished a login/logout transition.
    SessionChanged(SessionSnapshot),
    LogoutClicked,
    /// Interval timer fired.
    PollTick,
    /// Explicit out-of-cycle refresh.
    RefreshRequested,
    /// Backend answered `GET /urls` for `ticket`.
    RowsFetched {
        ticket: FetchTicket,
        result: Result<Vec<TrackedUrl>, RequestFailure>,
    },
    SearchChanged(String),
    PageSelected(usize),
    PageSizeSelected(usize),
    /// Start or restart, depending on each row's status.
    StartClicked(Vec<UrlId>),
    StopClicked(Vec<UrlId>),
    /// First phase of delete: ask for confirmation.
    DeleteRequested(UrlId),
    DeleteConfirmed,
    DeleteCancelled,
    AddUrlOpened,
    AddUrlInputChanged(String),
    AddUrlSubmitted,
    AddUrlCancelled,
    /// Backend answered a dispatched command.
    CommandReplied {
        command: Command,
        result: Result<(), RequestFailure>,
    },
    AnalyticsOpened(UrlId),
    AnalyticsClosed,
    LinkStatsLoaded {
        key: PanelKey,
        result: Result<LinkStats, RequestFailure>,
    },
    BrokenLinksLoaded {
        key: PanelKey,
        result: Result<Vec<BrokenLink>, RequestFailure>,
    },
    /// Oldest notice was dismissed by hand.
    NoticeDismissed,
    /// UI/render tick; also ages notices by `TICK_INTERVAL`.
    Tick,
    NoOp,
}
