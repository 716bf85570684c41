//! Conversion error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::drawing::DrawingError;

/// Run-level conversion failures.
///
/// Problems with individual entities never surface here; they are counted
/// as skipped. A destination collision is an outcome, not an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source drawing missing or unreadable
    #[error(transparent)]
    Input(#[from] DrawingError),

    /// Nothing in the drawing could be converted
    #[error("No convertible entities found ({skipped} skipped)")]
    EmptyResult { skipped: usize },

    /// Writing the output failed
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The conversion worker panicked or was aborted
    #[error("conversion worker failed: {0}")]
    Worker(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
