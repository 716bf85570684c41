//! Logger seam for components that run outside a `tracing` span context.
//!
//! The conversion pipeline takes an `Arc<dyn Logger>` instead of calling
//! `tracing` directly, so tests can silence it ([`NoOpLogger`]) or inspect
//! what it reported ([`MemoryLogger`]).
//!
//! ```
//! use std::sync::Arc;
//! use surveykml::log::{LogLevel, Logger, MemoryLogger};
//! use surveykml::log_warn;
//!
//! let memory = Arc::new(MemoryLogger::new());
//! let logger: Arc<dyn Logger> = memory.clone();
//! log_warn!(logger, "skipped {} entities on layer {}", 3, "ROADS");
//!
//! assert_eq!(
//!     memory.entries(),
//!     vec![(LogLevel::Warn, "skipped 3 entities on layer ROADS".to_string())]
//! );
//! ```

mod memory;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
