//! Bridge from [`Logger`] to the `tracing` macros.

use std::fmt::Arguments;

use tracing::Level;

use crate::log::{LogLevel, Logger};

/// Forwards messages to `tracing`, tagged with a component name.
///
/// Output goes wherever the global subscriber sends it; see
/// [`crate::logging::init_logging`].
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("surveykml")
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let component = self.component;
        match level {
            LogLevel::Trace => tracing::trace!(component, "{}", args),
            LogLevel::Debug => tracing::debug!(component, "{}", args),
            LogLevel::Info => tracing::info!(component, "{}", args),
            LogLevel::Warn => tracing::warn!(component, "{}", args),
            LogLevel::Error => tracing::error!(component, "{}", args),
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(Level::TRACE),
            LogLevel::Debug => tracing::enabled!(Level::DEBUG),
            LogLevel::Info => tracing::enabled!(Level::INFO),
            LogLevel::Warn => tracing::enabled!(Level::WARN),
            LogLevel::Error => tracing::enabled!(Level::ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_name() {
        assert_eq!(TracingLogger::default().component(), "surveykml");
        assert_eq!(TracingLogger::new("convert").component(), "convert");
    }

    #[test]
    fn test_enabled_follows_subscriber_level() {
        let logger: Box<dyn Logger> = Box::new(TracingLogger::new("convert"));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_writer(std::io::sink)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(logger.enabled(LogLevel::Error));
            assert!(logger.enabled(LogLevel::Warn));
            assert!(!logger.enabled(LogLevel::Debug));
            crate::log_warn!(logger, "written to the sink");
        });
    }
}
