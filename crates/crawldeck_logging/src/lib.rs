#![deny(missing_docs)]
//! Shared logging utilities for the crawldeck workspace.
//!
//! This crate provides the `deck_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Engine call the current thread is issuing or handling a reply for.
    static CURRENT_CALL: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Tags every `deck_*` line logged on this thread with `call_id` until the
/// returned guard is dropped. Scopes nest; the outer call is restored on drop.
pub fn enter_call(call_id: u64) -> CallScope {
    let previous = CURRENT_CALL.with(|c| c.replace(Some(call_id)));
    CallScope { previous }
}

/// Returns the call recorded for the current thread, if any.
pub fn current_call() -> Option<u64> {
    CURRENT_CALL.with(|c| c.get())
}

/// Guard returned by [`enter_call`].
#[must_use = "the call tag is removed when the scope is dropped"]
pub struct CallScope {
    previous: Option<u64>,
}

impl Drop for CallScope {
    fn drop(&mut self) {
        CURRENT_CALL.with(|c| c.set(self.previous));
    }
}

/// Line prefix for the current call scope, empty outside one.
#[doc(hidden)]
pub fn call_prefix() -> String {
    match current_call() {
        Some(call_id) => format!("[call {call_id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! deck_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::call_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! deck_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::call_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! deck_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::call_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! deck_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::call_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! deck_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::call_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
