//! Crawldeck engine: backend HTTP client, call execution and file persistence.
mod api;
mod engine;
mod persist;
mod types;

pub use api::{
    ApiSettings, ConsoleApi, NoToken, ReqwestApiClient, TokenSource, DEFAULT_BASE_URL,
};
pub use engine::{execute, EngineHandle};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use types::{
    ApiCall, ApiError, ApiReply, BrokenLinkRecord, CallId, EngineEvent, FailureKind,
    LinkCountRecord, UrlRecord,
};
