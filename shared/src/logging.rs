//! Shared logging utilities for consistent tracing across all crates

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Crates whose events are shown at the requested level; everything else is kept quiet
const WORKSPACE_TARGETS: &[&str] = &["imagevolve", "evolution", "generator", "shared"];

/// Build the `EnvFilter` directive string for a base level
pub fn filter_directives(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={base_level}"))
        .collect();
    directives.push("reqwest=warn".to_string());
    directives.push("hyper=warn".to_string());
    directives.join(",")
}

/// Initialize the stdout tracing subscriber.
///
/// `RUST_LOG` wins over the level argument when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for session-aware info logging
#[macro_export]
macro_rules! session_info {
    ($session:expr, $($arg:tt)*) => {
        tracing::info!(
            session = %$session,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware warning logging
#[macro_export]
macro_rules! session_warn {
    ($session:expr, $($arg:tt)*) => {
        tracing::warn!(
            session = %$session,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware error logging
#[macro_export]
macro_rules! session_error {
    ($session:expr, $($arg:tt)*) => {
        tracing::error!(
            session = %$session,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for session-aware debug logging
#[macro_export]
macro_rules! session_debug {
    ($session:expr, $($arg:tt)*) => {
        tracing::debug!(
            session = %$session,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(timestamp = format_timestamp(), "🛑 Shutting down: {}", reason);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}
