//! Logger that keeps messages in memory.

use std::fmt::Arguments;
use std::sync::Mutex;

use crate::log::{LogLevel, Logger};

/// Records every message with its level, in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages at `level` or above.
    pub fn messages_at_least(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l >= level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, args.to_string()));
        }
    }
}
