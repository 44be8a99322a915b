//! FILENAME: core/report-engine/src/logging.rs
// PURPOSE: Category-tagged logging macros over the `log` facade.
// CONTEXT: The category becomes the log target, so a host can filter on
// RENDER / GROUP / SOURCE / AREA. The library never installs a logger.

// ============================================================================
// CATEGORIES
// ============================================================================

pub const RENDER: &str = "RENDER";
pub const GROUP: &str = "GROUP";
pub const SOURCE: &str = "SOURCE";
pub const AREA: &str = "AREA";

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        log::warn!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        log::error!(target: $cat, $($arg)*)
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        log::debug!(target: $cat, "[ENTER] {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        log::debug!(target: $cat, "[ENTER] {} {}", $func, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        log::debug!(target: $cat, "[EXIT] {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        log::debug!(target: $cat, "[EXIT] {} {}", $func, format_args!($($arg)*))
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_info;`
pub use log_debug;
pub use log_enter;
pub use log_error;
pub use log_exit;
pub use log_info;
pub use log_warn;
