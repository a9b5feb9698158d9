#![deny(missing_docs)]
//! Shared logging utilities for the applies workspace.
//!
//! This crate provides the `applies_*` logging macros used across the codebase,
//! the execution-context log targets, and a minimal test initializer for the
//! global logger.

/// Isolation context a log line originates from.
///
/// The tap, the relay and the UI never share memory, so every log line names
/// the context it was emitted in through its `log` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecContext {
    /// The page context holding live network access (tap and fetcher).
    Page,
    /// The content-level relay between the page and the UI.
    Content,
    /// The UI-facing requester.
    Ui,
}

impl ExecContext {
    /// `log` target used for lines emitted from this context.
    pub const fn target(self) -> &'static str {
        match self {
            ExecContext::Page => "applies::page",
            ExecContext::Content => "applies::content",
            ExecContext::Ui => "applies::ui",
        }
    }

    /// Short label, as shown in status output.
    pub const fn label(self) -> &'static str {
        match self {
            ExecContext::Page => "page",
            ExecContext::Content => "content",
            ExecContext::Ui => "ui",
        }
    }
}

/// Logs a trace-level message. Prefix with `ctx = <ExecContext>;` to tag the line.
#[macro_export]
macro_rules! applies_trace {
    (ctx = $ctx:expr; $($arg:tt)+) => {{
        log::trace!(target: $crate::ExecContext::target($ctx), $($arg)+);
    }};
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message. Prefix with `ctx = <ExecContext>;` to tag the line.
#[macro_export]
macro_rules! applies_debug {
    (ctx = $ctx:expr; $($arg:tt)+) => {{
        log::debug!(target: $crate::ExecContext::target($ctx), $($arg)+);
    }};
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message. Prefix with `ctx = <ExecContext>;` to tag the line.
#[macro_export]
macro_rules! applies_info {
    (ctx = $ctx:expr; $($arg:tt)+) => {{
        log::info!(target: $crate::ExecContext::target($ctx), $($arg)+);
    }};
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message. Prefix with `ctx = <ExecContext>;` to tag the line.
#[macro_export]
macro_rules! applies_warn {
    (ctx = $ctx:expr; $($arg:tt)+) => {{
        log::warn!(target: $crate::ExecContext::target($ctx), $($arg)+);
    }};
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message. Prefix with `ctx = <ExecContext>;` to tag the line.
#[macro_export]
macro_rules! applies_error {
    (ctx = $ctx:expr; $($arg:tt)+) => {{
        log::error!(target: $crate::ExecContext::target($ctx), $($arg)+);
    }};
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Show the context target on every line.
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Trace)
        .build();

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
