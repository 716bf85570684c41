//! Layer discovery, colors and enable state.
//!
//! ```
//! use surveykml::drawing::GeometryKind;
//! use surveykml::layer::LayerRegistry;
//!
//! let mut registry = LayerRegistry::scan([
//!     ("Boundary", GeometryKind::ClosedPolyline),
//!     ("Roads", GeometryKind::Line),
//! ]);
//! registry.toggle("Roads");
//! assert_eq!(registry.enabled_count(), 1);
//! assert_eq!(registry.get("Boundary").unwrap().color().name, "Red");
//! ```

mod palette;
mod registry;

pub use palette::{color, PaletteColor, PALETTE, PALETTE_SIZE};
pub use registry::{Layer, LayerRegistry};
