//! Drawing input: the entity model read from CAD drawings.
//!
//! Only three geometry kinds are recognized: closed polylines, open
//! polylines and two-point lines. Everything else in a drawing is ignored
//! by the reader. Entities that are recognized but cannot be extracted
//! (polygon meshes, malformed coordinates) are still returned, carrying an
//! [`InvalidGeometry`] reason, so that layer statistics count them.

mod dxf;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::geodesy::GridPoint;

pub use dxf::DxfReader;

/// Layer assumed for entities without a layer attribute.
pub const DEFAULT_LAYER: &str = "0";

/// Recognized entity geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Polyline whose closed flag is set
    ClosedPolyline,
    /// Polyline whose closed flag is clear
    OpenPolyline,
    /// Two-point line
    Line,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedPolyline => write!(f, "closed polyline"),
            Self::OpenPolyline => write!(f, "open polyline"),
            Self::Line => write!(f, "line"),
        }
    }
}

/// Why an entity's geometry cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidGeometry {
    /// A coordinate value was missing or not a number
    MalformedCoordinates,
    /// Recognized entity type with an unsupported variant (e.g. a mesh)
    UnsupportedSubKind(&'static str),
}

impl fmt::Display for InvalidGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCoordinates => write!(f, "malformed coordinate data"),
            Self::UnsupportedSubKind(kind) => write!(f, "unsupported {}", kind),
        }
    }
}

/// Raw geometry of an entity, in grid coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Polyline vertices in drawing order
    Vertices(Vec<GridPoint>),
    /// Line endpoints
    Segment { start: GridPoint, end: GridPoint },
    /// Geometry that cannot be extracted
    Invalid(InvalidGeometry),
}

/// One recognized entity from a drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingEntity {
    /// Layer attribute, if the entity carried one
    pub layer: Option<String>,
    /// Geometry kind
    pub kind: GeometryKind,
    /// Raw geometry
    pub geometry: Geometry,
}

impl DrawingEntity {
    /// Create a polyline entity.
    pub fn polyline(layer: &str, vertices: Vec<GridPoint>, closed: bool) -> Self {
        let kind = if closed {
            GeometryKind::ClosedPolyline
        } else {
            GeometryKind::OpenPolyline
        };
        Self {
            layer: Some(layer.to_string()),
            kind,
            geometry: Geometry::Vertices(vertices),
        }
    }

    /// Create a two-point line entity.
    pub fn line(layer: &str, start: GridPoint, end: GridPoint) -> Self {
        Self {
            layer: Some(layer.to_string()),
            kind: GeometryKind::Line,
            geometry: Geometry::Segment { start, end },
        }
    }

    /// Layer name, falling back to [`DEFAULT_LAYER`].
    pub fn layer_name(&self) -> &str {
        self.layer.as_deref().unwrap_or(DEFAULT_LAYER)
    }

    /// Extract the vertex list to convert.
    ///
    /// Polylines yield all vertices, lines yield exactly their two
    /// endpoints. Fails if the geometry is invalid, has fewer than two
    /// vertices, or contains non-finite coordinates.
    pub fn vertices(&self) -> Result<Vec<GridPoint>, ExtractError> {
        let vertices = match &self.geometry {
            Geometry::Vertices(v) => v.clone(),
            Geometry::Segment { start, end } => vec![*start, *end],
            Geometry::Invalid(reason) => return Err(ExtractError::Invalid(*reason)),
        };
        if vertices.len() < 2 {
            return Err(ExtractError::TooFewVertices(vertices.len()));
        }
        if vertices.iter().any(|p| !p.is_finite()) {
            return Err(ExtractError::Invalid(InvalidGeometry::MalformedCoordinates));
        }
        Ok(vertices)
    }
}

/// Per-entity extraction failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("{0} vertices, at least 2 required")]
    TooFewVertices(usize),
    #[error("{0}")]
    Invalid(InvalidGeometry),
}

/// Errors reading a drawing.
#[derive(Debug, thiserror::Error)]
pub enum DrawingError {
    #[error("Cannot read drawing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid DXF at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A loaded drawing: its name and recognized entities in source order.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    name: String,
    source: Option<PathBuf>,
    entities: Vec<DrawingEntity>,
}

impl Drawing {
    /// Read a DXF drawing from disk.
    pub fn open(path: &Path) -> Result<Self, DrawingError> {
        let entities = DxfReader::read_path(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "drawing".to_string());

        tracing::debug!(
            path = %path.display(),
            entities = entities.len(),
            "Drawing loaded"
        );

        Ok(Self {
            name,
            source: Some(path.to_path_buf()),
            entities,
        })
    }

    /// Build a drawing from entities already in memory.
    pub fn from_entities(name: &str, entities: Vec<DrawingEntity>) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            entities,
        }
    }

    /// Base name used for output files.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the drawing was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Recognized entities in source order.
    pub fn entities(&self) -> &[DrawingEntity] {
        &self.entities
    }

    /// `(layer, kind)` pairs in source order, as consumed by the layer registry.
    pub fn layer_sightings(&self) -> impl Iterator<Item = (&str, GeometryKind)> + '_ {
        self.entities.iter().map(|e| (e.layer_name(), e.kind))
    }
}
