//! SurveyKML - survey drawings on the map
//!
//! Converts land-survey drawings in the Sri Lanka Datum 1999 (SLD99) grid to
//! KML for Google Earth, and reports the surveyor's own position in both
//! WGS84 and SLD99.
//!
//! # Modules
//!
//! - [`geodesy`]: SLD99 grid ↔ WGS84 transform
//! - [`drawing`]: DXF reading and vertex extraction
//! - [`layer`]: per-layer selection and colors
//! - [`convert`]: drawing → KML pipeline with collision handling
//! - [`location`]: timeout-bounded, cancellable position acquisition
//! - [`config`], [`log`], [`logging`]: configuration and logging
//!
//! # Example
//!
//! ```no_run
//! use surveykml::convert::{ConversionOutcome, ConversionPipeline, NoProgress};
//! use surveykml::drawing::Drawing;
//! use surveykml::layer::LayerRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let drawing = Drawing::open("plan.dxf".as_ref())?;
//! let registry = LayerRegistry::scan(drawing.layer_sightings());
//!
//! let pipeline = ConversionPipeline::default();
//! match pipeline.run_drawing(&drawing, &registry, "out".as_ref(), &NoProgress)? {
//!     ConversionOutcome::Written(result) => println!("{}", result.destination.display()),
//!     ConversionOutcome::Collision(result) => println!("{} exists", result.destination.display()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod drawing;
pub mod geodesy;
pub mod layer;
pub mod location;
pub mod log;
pub mod logging;

/// Version of the library and CLI, taken from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
