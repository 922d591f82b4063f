//! # Sonar Common
//!
//! Types shared by every crate in the workspace: scan targets and their
//! expansion into concrete addresses, probe results, monitor views,
//! configuration and the typed errors that cross crate boundaries.
//!
//! Library code never prints. The logging macros below emit `tracing` events
//! which the binary formats.

pub mod config;
pub mod error;
pub mod models;
pub mod network;

#[doc(hidden)]
pub use tracing as __tracing;

/// Informational event, rendered with a `[+]` prefix by the terminal formatter.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!($($arg)*)
    };
}

/// A milestone reached successfully.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "sonar::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!($($arg)*)
    };
}
