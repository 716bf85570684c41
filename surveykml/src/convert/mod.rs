//! Drawing to KML conversion pipeline.
//!
//! # Flow
//!
//! ```text
//! Drawing ─► per entity: layer filter ─► extract vertices ─► forward()
//!                                                              │
//!                     KmlDocument ◄── style + placemark ◄──────┘
//!                          │
//!             create_new(<dest>/<stem>.kml)
//!               ├─ ok      ─► Written
//!               └─ exists  ─► Collision ─► finalize(Overwrite | AutoRename | Cancel)
//! ```
//!
//! Entities that cannot be converted are counted as skipped and never abort
//! the run. A run that converts nothing fails with
//! [`PipelineError::EmptyResult`] and writes no file.

mod error;
mod kml;
mod output;
mod progress;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::drawing::{Drawing, DrawingEntity, ExtractError};
use crate::geodesy::{GeodeticError, GeodeticTransform, GeographicPoint};
use crate::layer::LayerRegistry;
use crate::log::{Logger, NoOpLogger};
use crate::{log_debug, log_info, log_warn};

pub use error::PipelineError;
pub use kml::{escape, style_id, KmlDocument, DEFAULT_STYLE_COLOR, DEFAULT_STYLE_ID};
pub use progress::{ChannelProgress, NoProgress, Progress, ProgressSink, ProgressStage};
pub use worker::{spawn_conversion, ConversionTask};

/// Document name used when none is configured.
pub const DEFAULT_DOCUMENT_NAME: &str = "Survey Plan - SLD99";

/// Progress is reported every this many entities.
const PROGRESS_BATCH: usize = 10;

/// An assembled KML document and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Serialized KML
    pub document: String,
    /// Target path (for a collision, the existing file)
    pub destination: PathBuf,
    /// Entities written as placemarks
    pub converted: usize,
    /// Entities left out
    pub skipped: usize,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Document written to `result.destination`
    Written(ConversionResult),
    /// A file already exists at `result.destination`; nothing was written.
    /// Pass the result to [`ConversionPipeline::finalize`].
    Collision(ConversionResult),
}

/// How to resolve a destination collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDecision {
    /// Replace the existing file
    Overwrite,
    /// Write to `<stem>_N.kml` with the smallest free `N`
    AutoRename,
    /// Discard the result
    Cancel,
}

/// Outcome of [`ConversionPipeline::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Written; `destination` is the path actually used
    Written(ConversionResult),
    /// Discarded; the filesystem is untouched
    Cancelled,
}

/// Why an entity was skipped.
#[derive(Debug)]
enum SkipReason {
    LayerDisabled,
    Extract(ExtractError),
    Domain(GeodeticError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerDisabled => write!(f, "layer disabled"),
            Self::Extract(e) => write!(f, "{}", e),
            Self::Domain(e) => write!(f, "{}", e),
        }
    }
}

/// Converts drawings to KML with a fixed transform.
///
/// The pipeline holds no per-run state; a single instance can serve any
/// number of runs, including concurrent ones on different threads.
pub struct ConversionPipeline {
    transform: GeodeticTransform,
    document_name: String,
    logger: Arc<dyn Logger>,
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        Self::new(GeodeticTransform::sld99(), Arc::new(NoOpLogger))
    }
}

impl ConversionPipeline {
    pub fn new(transform: GeodeticTransform, logger: Arc<dyn Logger>) -> Self {
        Self {
            transform,
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            logger,
        }
    }

    /// Set the `<name>` of generated documents.
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    /// Read the drawing at `source` and convert it into `destination`.
    pub fn run(
        &self,
        source: &Path,
        registry: &LayerRegistry,
        destination: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, PipelineError> {
        progress.report(Progress::new(ProgressStage::ReadStarted));
        let drawing = Drawing::open(source)?;
        self.run_drawing(&drawing, registry, destination, progress)
    }

    /// Convert an already loaded drawing into `destination`.
    pub fn run_drawing(
        &self,
        drawing: &Drawing,
        registry: &LayerRegistry,
        destination: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, PipelineError> {
        let (document, converted, skipped) = self.assemble(drawing, registry, progress)?;

        let target = destination.join(format!("{}.kml", drawing.name()));
        let result = ConversionResult {
            document,
            destination: target,
            converted,
            skipped,
        };

        progress.report(Progress::new(ProgressStage::SaveStarted));
        match output::write_exclusive(&result.destination, &result.document)
            .map_err(|e| PipelineError::io(&result.destination, e))?
        {
            output::WriteAttempt::Written => {
                progress.report(Progress::new(ProgressStage::Done));
                log_info!(
                    self.logger,
                    "KML written to {} ({} converted, {} skipped)",
                    result.destination.display(),
                    converted,
                    skipped
                );
                Ok(ConversionOutcome::Written(result))
            }
            output::WriteAttempt::Exists => {
                log_info!(
                    self.logger,
                    "Destination {} already exists, awaiting decision",
                    result.destination.display()
                );
                Ok(ConversionOutcome::Collision(result))
            }
        }
    }

    /// Build the KML document for a drawing without writing it.
    ///
    /// Returns the document, the converted count and the skipped count.
    pub fn assemble(
        &self,
        drawing: &Drawing,
        registry: &LayerRegistry,
        progress: &dyn ProgressSink,
    ) -> Result<(String, usize, usize), PipelineError> {
        let entities = drawing.entities();
        let total = entities.len();
        progress.report(Progress::new(ProgressStage::EntitiesScanned { total }));

        let mut features: Vec<(String, String, Vec<GeographicPoint>)> = Vec::new();
        let mut skipped = 0;

        for (i, entity) in entities.iter().enumerate() {
            if i % PROGRESS_BATCH == 0 {
                progress.report(Progress::new(ProgressStage::Converting { done: i, total }));
            }
            match self.convert_entity(entity, registry) {
                Ok((style, path)) => features.push((entity.layer_name().to_string(), style, path)),
                Err(reason) => {
                    log_debug!(
                        self.logger,
                        "Skipping {} on layer '{}': {}",
                        entity.kind,
                        entity.layer_name(),
                        reason
                    );
                    skipped += 1;
                }
            }
        }
        progress.report(Progress::new(ProgressStage::Converting { done: total, total }));

        if skipped > 0 {
            log_warn!(
                self.logger,
                "{} of {} entities in '{}' were not converted",
                skipped,
                total,
                drawing.name()
            );
        }
        if features.is_empty() {
            return Err(PipelineError::EmptyResult { skipped });
        }

        let mut doc = KmlDocument::new(&self.document_name);
        // Styles in registry discovery order, only for layers actually used
        for layer in registry.iter().filter(|l| l.enabled) {
            if features.iter().any(|(name, _, _)| name == layer.name()) {
                doc.add_style(style_id(layer.name()), layer.color().kml);
            }
        }
        for (n, (layer, style, path)) in features.iter().enumerate() {
            doc.add_placemark(&format!("{} #{}", layer, n + 1), style, path);
        }

        let converted = doc.placemark_count();
        Ok((doc.finish(), converted, skipped))
    }

    /// Filter, extract and transform one entity. Returns its style id and path.
    fn convert_entity(
        &self,
        entity: &DrawingEntity,
        registry: &LayerRegistry,
    ) -> Result<(String, Vec<GeographicPoint>), SkipReason> {
        let layer = registry.get(entity.layer_name());
        if matches!(layer, Some(l) if !l.enabled) {
            return Err(SkipReason::LayerDisabled);
        }

        let vertices = entity.vertices().map_err(SkipReason::Extract)?;
        let path = vertices
            .into_iter()
            .map(|p| self.transform.forward(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(SkipReason::Domain)?;

        let style = match layer {
            Some(l) => style_id(l.name()),
            None => DEFAULT_STYLE_ID.to_string(),
        };
        Ok((style, path))
    }

    /// Resolve a collision reported by [`run`](Self::run).
    pub fn finalize(
        &self,
        mut result: ConversionResult,
        decision: CollisionDecision,
    ) -> Result<FinalizeOutcome, PipelineError> {
        match decision {
            CollisionDecision::Cancel => {
                log_info!(
                    self.logger,
                    "Conversion discarded, {} left unchanged",
                    result.destination.display()
                );
                Ok(FinalizeOutcome::Cancelled)
            }
            CollisionDecision::Overwrite => {
                output::write_overwrite(&result.destination, &result.document)
                    .map_err(|e| PipelineError::io(&result.destination, e))?;
                log_info!(self.logger, "Overwrote {}", result.destination.display());
                Ok(FinalizeOutcome::Written(result))
            }
            CollisionDecision::AutoRename => {
                let written = output::write_renamed(&result.destination, &result.document)
                    .map_err(|e| PipelineError::io(&result.destination, e))?;
                log_info!(self.logger, "KML written to {}", written.display());
                result.destination = written;
                Ok(FinalizeOutcome::Written(result))
            }
        }
    }
}
