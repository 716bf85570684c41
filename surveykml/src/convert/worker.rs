//! Running a conversion off the caller's task.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{ChannelProgress, ConversionOutcome, ConversionPipeline, PipelineError, Progress};
use crate::layer::LayerRegistry;

/// A conversion running on a blocking worker thread.
///
/// Progress arrives on `progress` in checkpoint order; the channel closes
/// when the worker finishes.
pub struct ConversionTask {
    pub progress: mpsc::UnboundedReceiver<Progress>,
    handle: JoinHandle<Result<ConversionOutcome, PipelineError>>,
}

impl ConversionTask {
    /// Wait for the worker and return its outcome.
    pub async fn finish(self) -> Result<ConversionOutcome, PipelineError> {
        self.handle
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))?
    }
}

/// Start `pipeline.run(source, registry, destination)` on the blocking pool.
///
/// The registry is moved into the worker; the caller keeps no shared state
/// with the run. Must be called from within a tokio runtime.
pub fn spawn_conversion(
    pipeline: Arc<ConversionPipeline>,
    source: PathBuf,
    registry: LayerRegistry,
    destination: PathBuf,
) -> ConversionTask {
    let (sink, progress) = ChannelProgress::channel();
    let handle = tokio::task::spawn_blocking(move || {
        let span = tracing::info_span!("convert", source = %source.display());
        let _guard = span.enter();
        pipeline.run(&source, &registry, &destination, &sink)
    });
    ConversionTask { progress, handle }
}
