/// Logging macros for the probe crates, wrapping `tracing` so each level can be
/// compiled out through cargo features (`log_info`, `log_warnings`, `log_errors`,
/// `log_debug`).
///
/// The feature checks resolve against this crate's features, not the caller's, so
/// enabling `probe_trace/standard` once in a binary turns logging on for every
/// library crate that uses these macros.
/// See similar: https://doc.rust-lang.org/src/std/macros.rs.html#138-145.

#[doc(hidden)]
pub const INFO_ENABLED: bool = cfg!(feature = "log_info");

#[doc(hidden)]
pub const WARN_ENABLED: bool = cfg!(feature = "log_warnings");

#[doc(hidden)]
pub const ERROR_ENABLED: bool = cfg!(feature = "log_errors");

#[doc(hidden)]
pub const DEBUG_ENABLED: bool = cfg!(feature = "log_debug");

#[doc(hidden)]
pub use tracing as __tracing;

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        if $crate::INFO_ENABLED {
            $crate::__tracing::info!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        if $crate::WARN_ENABLED {
            $crate::__tracing::warn!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        if $crate::DEBUG_ENABLED {
            $crate::__tracing::debug!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        if $crate::ERROR_ENABLED {
            $crate::__tracing::error!($($t)*);
        }
    };
}

/// Maps a configured level name (`error`, `warn`, `info`, `debug`, `trace`) onto a
/// [`tracing::Level`], case-insensitively. Unknown names yield `None`.
#[must_use]
pub fn parse_level(name: &str) -> Option<tracing::Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
