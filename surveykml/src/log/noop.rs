//! Logger that drops everything.

use std::fmt::Arguments;

use crate::log::{LogLevel, Logger};

/// Discards all messages. The default logger of a `ConversionPipeline`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}

    #[inline]
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}
