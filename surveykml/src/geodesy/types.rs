//! Coordinate and datum type definitions

use std::fmt;

/// Arc-seconds to radians.
const ARC_SECOND: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// A position in the local projected grid, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    /// Easting (x), meters
    pub easting: f64,
    /// Northing (y), meters
    pub northing: f64,
}

impl GridPoint {
    #[inline]
    pub const fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.easting.is_finite() && self.northing.is_finite()
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E {:.3} N {:.3}", self.easting, self.northing)
    }
}

/// A geographic position in degrees on the global datum (altitude 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicPoint {
    /// Longitude in degrees, positive east
    pub longitude: f64,
    /// Latitude in degrees, positive north
    pub latitude: f64,
}

impl GeographicPoint {
    #[inline]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl fmt::Display for GeographicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7}°, {:.7}°", self.latitude, self.longitude)
    }
}

/// Reference ellipsoid defined by semi-major axis and flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis, meters
    pub semi_major_axis: f64,
    /// Flattening (not inverse)
    pub flattening: f64,
}

impl Ellipsoid {
    /// Everest 1830 (1937 adjustment) as used by the Sri Lankan grids.
    pub const EVEREST_1830: Self = Self {
        semi_major_axis: 6_377_276.345,
        flattening: 1.0 / 300.8017,
    };

    /// WGS84.
    pub const WGS84: Self = Self {
        semi_major_axis: 6_378_137.0,
        flattening: 1.0 / 298.257_223_563,
    };

    /// Semi-minor axis.
    #[inline]
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    /// First eccentricity squared.
    #[inline]
    pub fn e2(&self) -> f64 {
        2.0 * self.flattening - self.flattening * self.flattening
    }

    /// Second eccentricity squared.
    #[inline]
    pub fn ep2(&self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }

    /// Radius of curvature in the prime vertical at `lat` (radians).
    #[inline]
    pub fn prime_vertical_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        self.semi_major_axis / (1.0 - self.e2() * s * s).sqrt()
    }

    /// Meridional arc length from the equator to `lat` (radians).
    pub fn meridional_arc(&self, lat: f64) -> f64 {
        let e2 = self.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.semi_major_axis
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }
}

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// Latitude of origin in degrees
    pub latitude_of_origin: f64,
    /// Scale factor at the central meridian
    pub scale_factor: f64,
    /// False easting, meters
    pub false_easting: f64,
    /// False northing, meters
    pub false_northing: f64,
}

/// Seven-parameter Helmert shift from the local to the global frame.
///
/// Rotations follow the position-vector convention used by the published
/// SLD99 to WGS84 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    /// Translations (x, y, z), meters
    pub translation: [f64; 3],
    /// Rotations (x, y, z), arc-seconds
    pub rotation_arcsec: [f64; 3],
    /// Scale difference, parts per million
    pub scale_ppm: f64,
}

impl Helmert {
    /// Linear part of the shift as a row-major 3x3 matrix.
    fn matrix(&self) -> [[f64; 3]; 3] {
        let rx = self.rotation_arcsec[0] * ARC_SECOND;
        let ry = self.rotation_arcsec[1] * ARC_SECOND;
        let rz = self.rotation_arcsec[2] * ARC_SECOND;
        let s = 1.0 + self.scale_ppm * 1e-6;
        [[s, rz, -ry], [-rz, s, rx], [ry, -rx, s]]
    }

    /// Local geocentric → global geocentric.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = self.matrix();
        let t = self.translation;
        [
            t[0] + m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
            t[1] + m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
            t[2] + m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
        ]
    }

    /// Global geocentric → local geocentric.
    ///
    /// Solves the linear system exactly (Cramer's rule) rather than
    /// negating the small-angle parameters, so `apply_inverse(apply(p)) == p`
    /// to floating point precision.
    pub fn apply_inverse(&self, p: [f64; 3]) -> [f64; 3] {
        let m = self.matrix();
        let v = [
            p[0] - self.translation[0],
            p[1] - self.translation[1],
            p[2] - self.translation[2],
        ];
        let det = det3(&m);
        let mut out = [0.0; 3];
        for (k, slot) in out.iter_mut().enumerate() {
            let mut mk = m;
            for i in 0..3 {
                mk[i][k] = v[i];
            }
            *slot = det3(&mk) / det;
        }
        out
    }
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Limits of the region in which the projection series are trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingRegion {
    /// Maximum |easting - false easting| and |northing - false northing|, meters
    pub max_grid_offset: f64,
    /// Maximum |longitude - central meridian|, degrees
    pub max_longitude_offset: f64,
    /// Maximum |latitude|, degrees
    pub max_abs_latitude: f64,
}

/// Complete, immutable description of the local/global datum pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatumProfile {
    /// Ellipsoid of the local grid
    pub local: Ellipsoid,
    /// Ellipsoid of the global geographic system
    pub reference: Ellipsoid,
    /// Projection of the local grid
    pub projection: Projection,
    /// Local → global shift
    pub shift: Helmert,
    /// Valid input region
    pub region: OperatingRegion,
}

impl DatumProfile {
    /// Sri Lanka Grid 1999 (SLD99) on Everest 1830, shifted to WGS84.
    pub const fn sld99() -> Self {
        Self {
            local: Ellipsoid::EVEREST_1830,
            reference: Ellipsoid::WGS84,
            projection: Projection {
                central_meridian: 80.771_713_083_333_3,
                latitude_of_origin: 7.000_471_527_777_78,
                scale_factor: 0.999_923_841_8,
                false_easting: 500_000.0,
                false_northing: 500_000.0,
            },
            shift: Helmert {
                translation: [-0.293, 766.95, 87.713],
                rotation_arcsec: [-0.195_704, -1.695_068, -3.473_016],
                scale_ppm: -0.039_338,
            },
            region: OperatingRegion {
                max_grid_offset: 1_000_000.0,
                max_longitude_offset: 20.0,
                max_abs_latitude: 89.5,
            },
        }
    }
}

impl Default for DatumProfile {
    fn default() -> Self {
        Self::sld99()
    }
}

/// Errors that can occur during geodetic conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum GeodeticError {
    /// Grid input is non-finite or too far from the projection origin
    GridOutOfDomain(GridPoint),
    /// Geographic input is non-finite, too close to a pole, or too far from
    /// the central meridian
    GeographicOutOfDomain(GeographicPoint),
    /// Series evaluation produced a non-finite value
    NonFinite(&'static str),
}

impl fmt::Display for GeodeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeodeticError::GridOutOfDomain(p) => {
                write!(f, "Grid point outside the operating region: {}", p)
            }
            GeodeticError::GeographicOutOfDomain(p) => {
                write!(f, "Geographic point outside the operating region: {}", p)
            }
            GeodeticError::NonFinite(stage) => {
                write!(f, "Non-finite result during {}", stage)
            }
        }
    }
}

impl std::error::Error for GeodeticError {}
