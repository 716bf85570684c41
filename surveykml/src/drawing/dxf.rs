//! Reader for ASCII DXF drawings.
//!
//! DXF is a sequence of (group code, value) line pairs. Group code `0`
//! starts a new object; within the `ENTITIES` section we pick up:
//!
//! - `LWPOLYLINE` - layer (8), flags (70, bit 1 = closed), vertices (10/20)
//! - `POLYLINE` followed by `VERTEX` records (10/20) and `SEQEND`;
//!   flags 16/64 mark polygon/polyface meshes, which are not supported
//! - `LINE` - start (10/20) and end (11/21)
//!
//! Z coordinates are ignored. All other entity types are skipped, as are
//! entities marked as paper space (group 67 = 1); their `VERTEX` records
//! follow the parent `POLYLINE`.
//!
//! Values are decoded as UTF-8 with invalid bytes replaced, since older
//! drawings store layer names in a Windows code page.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{DrawingEntity, DrawingError, Geometry, GeometryKind, InvalidGeometry};
use crate::geodesy::GridPoint;

const FLAG_CLOSED: i32 = 1;
const FLAG_POLYGON_MESH: i32 = 16;
const FLAG_POLYFACE_MESH: i32 = 64;
/// Vertex flag for polyface face records, which carry no position.
const VERTEX_FACE_RECORD: i32 = 128;

const BINARY_SENTINEL: &str = "AutoCAD Binary DXF";

/// Parser for ASCII DXF.
pub struct DxfReader;

impl DxfReader {
    /// Read recognized entities from a DXF file.
    pub fn read_path(path: &Path) -> Result<Vec<DrawingEntity>, DrawingError> {
        let file = File::open(path).map_err(|source| DrawingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(file).map_err(|e| match e {
            DrawingError::Io { source, .. } => DrawingError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Read recognized entities from any reader.
    pub fn read<R: Read>(reader: R) -> Result<Vec<DrawingEntity>, DrawingError> {
        let mut parser = Parser::new(BufReader::new(reader));
        parser.run()?;

        if parser.ignored > 0 {
            tracing::debug!(
                ignored = parser.ignored,
                "Skipped unrecognized DXF entities"
            );
        }
        Ok(parser.entities)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityType {
    LwPolyline,
    Polyline,
    Line,
}

#[derive(Debug, Default)]
struct PartialPoint {
    x: Option<f64>,
    y: Option<f64>,
}

impl PartialPoint {
    fn complete(&self) -> Option<GridPoint> {
        Some(GridPoint::new(self.x?, self.y?))
    }
}

#[derive(Debug, Default)]
struct PendingVertex {
    point: PartialPoint,
    flags: i32,
}

/// Entity being assembled from group codes.
#[derive(Debug)]
struct PendingEntity {
    entity_type: EntityType,
    layer: Option<String>,
    flags: i32,
    points: Vec<PartialPoint>,
    end: PartialPoint,
    vertex: Option<PendingVertex>,
    malformed: bool,
    paper_space: bool,
}

impl PendingEntity {
    fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            layer: None,
            flags: 0,
            points: Vec::new(),
            end: PartialPoint::default(),
            vertex: None,
            malformed: false,
            paper_space: false,
        }
    }

    fn apply(&mut self, code: i32, value: &str) {
        if let Some(vertex) = self.vertex.as_mut() {
            match code {
                10 => vertex.point.x = parse_number(value, &mut self.malformed),
                20 => vertex.point.y = parse_number(value, &mut self.malformed),
                70 => vertex.flags = value.trim().parse().unwrap_or(0),
                _ => {}
            }
            return;
        }

        match (self.entity_type, code) {
            (_, 8) => self.layer = Some(value.trim().to_string()),
            (_, 70) => self.flags = value.trim().parse().unwrap_or(0),
            (_, 67) => self.paper_space = value.trim().parse::<i32>() == Ok(1),
            (EntityType::LwPolyline, 10) => self.points.push(PartialPoint {
                x: parse_number(value, &mut self.malformed),
                y: None,
            }),
            (EntityType::LwPolyline, 20) => match self.points.last_mut() {
                Some(p) if p.y.is_none() => p.y = parse_number(value, &mut self.malformed),
                _ => self.malformed = true,
            },
            (EntityType::Line, 10) => self.start_mut().x = parse_number(value, &mut self.malformed),
            (EntityType::Line, 20) => self.start_mut().y = parse_number(value, &mut self.malformed),
            (EntityType::Line, 11) => self.end.x = parse_number(value, &mut self.malformed),
            (EntityType::Line, 21) => self.end.y = parse_number(value, &mut self.malformed),
            _ => {}
        }
    }

    fn start_mut(&mut self) -> &mut PartialPoint {
        if self.points.is_empty() {
            self.points.push(PartialPoint::default());
        }
        &mut self.points[0]
    }

    fn begin_vertex(&mut self) {
        self.flush_vertex();
        self.vertex = Some(PendingVertex::default());
    }

    fn flush_vertex(&mut self) {
        if let Some(vertex) = self.vertex.take() {
            let face_only = vertex.flags & VERTEX_FACE_RECORD != 0 && vertex.flags & FLAG_POLYFACE_MESH == 0;
            if !face_only {
                self.points.push(vertex.point);
            }
        }
    }

    fn finish(mut self) -> DrawingEntity {
        self.flush_vertex();

        let kind = match self.entity_type {
            EntityType::Line => GeometryKind::Line,
            _ if self.flags & FLAG_CLOSED != 0 => GeometryKind::ClosedPolyline,
            _ => GeometryKind::OpenPolyline,
        };

        let geometry = if self.entity_type == EntityType::Polyline
            && self.flags & FLAG_POLYGON_MESH != 0
        {
            Geometry::Invalid(InvalidGeometry::UnsupportedSubKind("polygon mesh"))
        } else if self.entity_type == EntityType::Polyline
            && self.flags & FLAG_POLYFACE_MESH != 0
        {
            Geometry::Invalid(InvalidGeometry::UnsupportedSubKind("polyface mesh"))
        } else if self.malformed {
            Geometry::Invalid(InvalidGeometry::MalformedCoordinates)
        } else {
            self.geometry()
        };

        DrawingEntity {
            layer: self.layer,
            kind,
            geometry,
        }
    }

    fn geometry(&self) -> Geometry {
        match self.entity_type {
            EntityType::Line => {
                let start = self.points.first().and_then(PartialPoint::complete);
                match (start, self.end.complete()) {
                    (Some(start), Some(end)) => Geometry::Segment { start, end },
                    _ => Geometry::Invalid(InvalidGeometry::MalformedCoordinates),
                }
            }
            EntityType::LwPolyline | EntityType::Polyline => {
                let vertices: Option<Vec<GridPoint>> =
                    self.points.iter().map(PartialPoint::complete).collect();
                match vertices {
                    Some(v) => Geometry::Vertices(v),
                    None => Geometry::Invalid(InvalidGeometry::MalformedCoordinates),
                }
            }
        }
    }
}

fn parse_number(value: &str, malformed: &mut bool) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            *malformed = true;
            None
        }
    }
}

/// Streaming group-code parser.
struct Parser<R: BufRead> {
    reader: R,
    line_number: usize,
    line_bytes: Vec<u8>,
    code_buffer: String,
    value_buffer: String,
    expecting_section_name: bool,
    in_entities: bool,
    current: Option<PendingEntity>,
    entities: Vec<DrawingEntity>,
    ignored: usize,
}

impl<R: BufRead> Parser<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line_bytes: Vec::new(),
            code_buffer: String::new(),
            value_buffer: String::new(),
            expecting_section_name: false,
            in_entities: false,
            current: None,
            entities: Vec::new(),
            ignored: 0,
        }
    }

    fn io_error(source: std::io::Error) -> DrawingError {
        DrawingError::Io {
            path: Default::default(),
            source,
        }
    }

    /// Read one raw line into `target`, replacing invalid UTF-8.
    ///
    /// Returns the number of bytes consumed; 0 at end of input.
    fn read_line_lossy(
        reader: &mut R,
        bytes: &mut Vec<u8>,
        target: &mut String,
    ) -> Result<usize, DrawingError> {
        bytes.clear();
        target.clear();
        let read = reader.read_until(b'\n', bytes).map_err(Self::io_error)?;
        target.push_str(&String::from_utf8_lossy(bytes));
        Ok(read)
    }

    /// Read the next (code, value) pair into the buffers.
    ///
    /// Returns `Ok(None)` at end of input.
    fn next_pair(&mut self) -> Result<Option<i32>, DrawingError> {
        let read =
            Self::read_line_lossy(&mut self.reader, &mut self.line_bytes, &mut self.code_buffer)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if self.line_number == 1 && self.code_buffer.starts_with(BINARY_SENTINEL) {
            return Err(DrawingError::Parse {
                line: 1,
                message: "binary DXF is not supported".to_string(),
            });
        }

        let code = self
            .code_buffer
            .trim()
            .parse::<i32>()
            .map_err(|_| DrawingError::Parse {
                line: self.line_number,
                message: format!("expected group code, found '{}'", self.code_buffer.trim()),
            })?;

        let read =
            Self::read_line_lossy(&mut self.reader, &mut self.line_bytes, &mut self.value_buffer)?;
        if read == 0 {
            return Err(DrawingError::Parse {
                line: self.line_number,
                message: format!("group code {} has no value", code),
            });
        }
        self.line_number += 1;

        let trimmed_len = self.value_buffer.trim_end_matches(['\r', '\n']).len();
        self.value_buffer.truncate(trimmed_len);
        Ok(Some(code))
    }

    fn run(&mut self) -> Result<(), DrawingError> {
        while let Some(code) = self.next_pair()? {
            let value = std::mem::take(&mut self.value_buffer);
            let keep_going = self.handle(code, value.trim());
            self.value_buffer = value;
            if !keep_going {
                break;
            }
        }
        self.finish_current();
        Ok(())
    }

    /// Process one pair. Returns false at `EOF`.
    fn handle(&mut self, code: i32, value: &str) -> bool {
        if code == 2 && self.expecting_section_name {
            self.expecting_section_name = false;
            self.in_entities = value == "ENTITIES";
            return true;
        }
        if code != 0 {
            if let Some(current) = self.current.as_mut() {
                current.apply(code, value);
            }
            return true;
        }

        match value {
            "SECTION" => {
                self.finish_current();
                self.expecting_section_name = true;
            }
            "ENDSEC" => {
                self.finish_current();
                self.in_entities = false;
            }
            "EOF" => return false,
            _ if !self.in_entities => {}
            "VERTEX" if self.current_is_polyline() => {
                if let Some(current) = self.current.as_mut() {
                    current.begin_vertex();
                }
            }
            "SEQEND" if self.current_is_polyline() => self.finish_current(),
            other => {
                self.finish_current();
                self.current = match other {
                    "LWPOLYLINE" => Some(PendingEntity::new(EntityType::LwPolyline)),
                    "POLYLINE" => Some(PendingEntity::new(EntityType::Polyline)),
                    "LINE" => Some(PendingEntity::new(EntityType::Line)),
                    _ => {
                        self.ignored += 1;
                        None
                    }
                };
            }
        }
        true
    }

    fn current_is_polyline(&self) -> bool {
        matches!(
            self.current.as_ref().map(|c| c.entity_type),
            Some(EntityType::Polyline)
        )
    }

    fn finish_current(&mut self) {
        match self.current.take() {
            Some(pending) if pending.paper_space => self.ignored += 1,
            Some(pending) => self.entities.push(pending.finish()),
            None => {}
        }
    }
}
