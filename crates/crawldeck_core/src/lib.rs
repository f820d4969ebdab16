//! Crawldeck core: pure console state machine, session and table sync logic.
pub mod analytics;
pub mod dispatch;
mod effect;
mod failure;
pub mod filter;
pub mod forms;
pub mod guard;
mod msg;
mod rows;
pub mod session;
mod state;
pub mod sync;
pub mod token;
mod update;
mod view_model;

pub use analytics::{AnalyticsPanel, Panel, PanelKey};
pub use dispatch::{Command, Refusal};
pub use effect::Effect;
pub use failure::RequestFailure;
pub use filter::{filter, SearchFilter};
pub use guard::Route;
pub use msg::{AuthMode, FormField, Msg, TICK_INTERVAL};
pub use rows::{
    capitalize_status, format_timestamp, parse_timestamp, BrokenLink, LinkStats, TrackedUrl,
    UrlId, UrlStatus,
};
pub use session::{CredentialStore, MemoryCredentialStore, SessionSnapshot, SessionStore};
pub use state::{
    AppState, ConsoleSettings, Notice, NoticeLevel, Pagination, DEFAULT_PAGE_SIZE,
    PAGE_SIZE_OPTIONS,
};
pub use sync::{FetchTicket, SyncPhase, SyncTrigger, TableSync};
pub use token::{Identity, Role};
pub use update::update;
pub use view_model::{AppViewModel, AuthFormView, IdentityView, RowActions, RowView, TableView};
