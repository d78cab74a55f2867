//! Scoped logging macros that check a module-level `ENABLE_LOGS` flag.
//!
//! The first argument is the scope tag, which becomes the `log` target so
//! diagnostics can be filtered with `RUST_LOG=PERSIST=debug` and friends.
//!
//! Usage:
//! ```ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_debug, log_warn};
//!
//! log_warn!("PERSIST", "Session load failed: {}", err);
//! ```
//!
//! Nothing here can fail: with no logger installed every record is dropped.

/// Conditional debug logging under a scope tag.
///
/// Each module that uses this macro must define:
/// ```ignore
/// const ENABLE_LOGS: bool = true; // or false
/// ```
#[macro_export]
macro_rules! log_debug {
    ($scope:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: $scope, $($arg)*);
        }
    };
}

/// Conditional info logging under a scope tag.
#[macro_export]
macro_rules! log_info {
    ($scope:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: $scope, $($arg)*);
        }
    };
}

/// Conditional warn logging under a scope tag.
#[macro_export]
macro_rules! log_warn {
    ($scope:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: $scope, $($arg)*);
        }
    };
}

/// Conditional error logging under a scope tag.
#[macro_export]
macro_rules! log_error {
    ($scope:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: $scope, $($arg)*);
        }
    };
}
