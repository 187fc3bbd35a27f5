#![forbid(unsafe_code)]

//! Logging facade.
//!
//! Re-exports the `tracing` event macros when the `tracing` feature is on.
//! Without the feature the same macro names expand to nothing, so widget
//! code can log unconditionally.
//!
//! Use the macros in statement position only (`debug!(...);`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op error macro when tracing is disabled.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    /// No-op info macro when tracing is disabled.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

/// Whether structured logging was compiled in.
#[must_use]
pub const fn enabled() -> bool {
    cfg!(feature = "tracing")
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_accept_structured_fields() {
        let id = "popup-1";
        crate::debug!(popup = id, depth = 2, "opened");
        crate::warn!("plain message");
        let _ = id;
    }

    #[test]
    fn enabled_matches_feature() {
        assert_eq!(super::enabled(), cfg!(feature = "tracing"));
    }
}
