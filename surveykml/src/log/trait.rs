//! Logger trait and formatting macros.

use std::fmt::{self, Arguments};

/// Severity of a message, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for log messages.
///
/// The `log_*!` macros ask [`Logger::enabled`] first and only build the
/// message when it returns `true`, so per-entity debug lines cost nothing
/// when nobody listens.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    /// Whether a message at `level` would be kept.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }
}

/// Log through a [`Logger`] at an explicit [`LogLevel`].
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)*) => {{
        let level = $level;
        let logger = &$logger;
        if logger.enabled(level) {
            logger.log(level, format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Error, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Keeps warnings and errors; counts how many messages were formatted.
    #[derive(Default)]
    struct WarnOnly {
        formatted: AtomicUsize,
    }

    impl Logger for WarnOnly {
        fn log(&self, _level: LogLevel, args: Arguments<'_>) {
            let _ = args.to_string();
            self.formatted.fetch_add(1, Ordering::SeqCst);
        }

        fn enabled(&self, level: LogLevel) -> bool {
            level >= LogLevel::Warn
        }
    }

    #[test]
    fn test_levels_ordered_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    #[test]
    fn test_disabled_levels_are_not_logged() {
        let logger = WarnOnly::default();
        crate::log_debug!(logger, "entity {}", 1);
        crate::log_info!(logger, "entity {}", 2);
        crate::log_warn!(logger, "entity {}", 3);
        crate::log_at!(logger, LogLevel::Error, "entity {}", 4);

        assert_eq!(logger.formatted.load(Ordering::SeqCst), 2);
    }
}
