//! Geodetic conversion module
//!
//! Converts between the local projected grid (SLD99, Transverse Mercator on
//! Everest 1830) and WGS84 geographic coordinates:
//!
//! ```text
//! forward: grid ─TM⁻¹→ local lat/lon ─→ XYZ ─Helmert→ XYZ ─Bowring→ WGS84 lat/lon
//! inverse: WGS84 lat/lon ─→ XYZ ─Helmert⁻¹→ XYZ ─Bowring→ local lat/lon ─TM→ grid
//! ```
//!
//! The transform is `Copy` and holds no mutable state, so it can be shared
//! freely between threads.
//!
//! # Out-of-domain input
//!
//! Inputs that are non-finite or outside the profile's [`OperatingRegion`]
//! are rejected with [`GeodeticError`] instead of being clamped. Results are
//! checked as well, so a conversion never returns NaN or infinity.
//!
//! # Example
//!
//! ```
//! use surveykml::geodesy::{GeodeticTransform, GridPoint};
//!
//! let transform = GeodeticTransform::sld99();
//! let geo = transform.forward(GridPoint::new(399_158.594, 491_947.316)).unwrap();
//! assert!((geo.latitude - 6.9271).abs() < 1e-6);
//! ```

mod types;


pub use types::{
    DatumProfile, Ellipsoid, GeodeticError, GeographicPoint, GridPoint, Helmert,
    OperatingRegion, Projection,
};

/// Forward and inverse conversion for one fixed datum pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeodeticTransform {
    profile: DatumProfile,
}

impl GeodeticTransform {
    /// Create a transform for the given profile.
    pub const fn new(profile: DatumProfile) -> Self {
        Self { profile }
    }

    /// Transform for SLD99 ↔ WGS84.
    pub const fn sld99() -> Self {
        Self::new(DatumProfile::sld99())
    }

    /// The datum profile this transform was built from.
    pub fn profile(&self) -> &DatumProfile {
        &self.profile
    }

    /// Converts a grid point to WGS84 longitude/latitude.
    pub fn forward(&self, point: GridPoint) -> Result<GeographicPoint, GeodeticError> {
        let (lon, lat) = self.grid_to_local_radians(point)?;
        let local = geographic_to_geocentric(&self.profile.local, lon, lat);
        let global = self.profile.shift.apply(local);
        let (lon, lat) = geocentric_to_geographic(&self.profile.reference, global);

        let result = GeographicPoint::new(lon.to_degrees(), lat.to_degrees());
        if !result.is_finite() {
            return Err(GeodeticError::NonFinite("datum shift"));
        }
        Ok(result)
    }

    /// Converts a WGS84 longitude/latitude to a grid point.
    pub fn inverse(&self, point: GeographicPoint) -> Result<GridPoint, GeodeticError> {
        self.check_geographic(point)?;

        let global = geographic_to_geocentric(
            &self.profile.reference,
            point.longitude.to_radians(),
            point.latitude.to_radians(),
        );
        let local = self.profile.shift.apply_inverse(global);
        let (lon, lat) = geocentric_to_geographic(&self.profile.local, local);

        self.local_radians_to_grid(lon, lat)
    }

    /// Inverse projection only: grid point to longitude/latitude on the
    /// local ellipsoid, without the datum shift.
    pub fn grid_to_local(&self, point: GridPoint) -> Result<GeographicPoint, GeodeticError> {
        let (lon, lat) = self.grid_to_local_radians(point)?;
        Ok(GeographicPoint::new(lon.to_degrees(), lat.to_degrees()))
    }

    /// Forward projection only: longitude/latitude on the local ellipsoid to
    /// a grid point, without the datum shift.
    pub fn local_to_grid(&self, point: GeographicPoint) -> Result<GridPoint, GeodeticError> {
        self.check_geographic(point)?;
        self.local_radians_to_grid(point.longitude.to_radians(), point.latitude.to_radians())
    }

    fn check_geographic(&self, point: GeographicPoint) -> Result<(), GeodeticError> {
        let region = &self.profile.region;
        let lon_offset = (point.longitude - self.profile.projection.central_meridian).abs();
        if !point.is_finite()
            || point.latitude.abs() >= region.max_abs_latitude
            || lon_offset > region.max_longitude_offset
        {
            return Err(GeodeticError::GeographicOutOfDomain(point));
        }
        Ok(())
    }

    /// Transverse Mercator inverse series (footpoint latitude + D⁶ terms).
    fn grid_to_local_radians(&self, point: GridPoint) -> Result<(f64, f64), GeodeticError> {
        let proj = &self.profile.projection;
        let ellipsoid = &self.profile.local;

        let x = point.easting - proj.false_easting;
        let y = point.northing - proj.false_northing;
        let limit = self.profile.region.max_grid_offset;
        if !point.is_finite() || x.abs() > limit || y.abs() > limit {
            return Err(GeodeticError::GridOutOfDomain(point));
        }

        let a = ellipsoid.semi_major_axis;
        let e2 = ellipsoid.e2();
        let ep2 = ellipsoid.ep2();
        let k0 = proj.scale_factor;
        let lon0 = proj.central_meridian.to_radians();
        let lat0 = proj.latitude_of_origin.to_radians();

        // Footpoint latitude from the rectifying latitude
        let m = ellipsoid.meridional_arc(lat0) + y / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        let (e1_2, e1_3) = (e1 * e1, e1 * e1 * e1);
        let e1_4 = e1_2 * e1_2;
        let lat1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = lat1.sin_cos();
        let tan1 = lat1.tan();
        let denom = 1.0 - e2 * sin1 * sin1;
        let n1 = a / denom.sqrt();
        let r1 = a * (1.0 - e2) / denom.powf(1.5);
        let t1 = tan1 * tan1;
        let c1 = ep2 * cos1 * cos1;
        let d = x / (n1 * k0);
        let (d2, d3) = (d * d, d * d * d);
        let (d4, d5, d6) = (d2 * d2, d2 * d3, d3 * d3);

        let lat = lat1
            - (n1 * tan1 / r1)
                * (d2 / 2.0 - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lon = lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                    / 120.0)
                / cos1;

        if !lat.is_finite() || !lon.is_finite() {
            return Err(GeodeticError::NonFinite("inverse projection"));
        }
        Ok((lon, lat))
    }

    /// Transverse Mercator forward series (meridional arc + A⁶ terms).
    fn local_radians_to_grid(&self, lon: f64, lat: f64) -> Result<GridPoint, GeodeticError> {
        let proj = &self.profile.projection;
        let ellipsoid = &self.profile.local;

        let e2 = ellipsoid.e2();
        let ep2 = ellipsoid.ep2();
        let k0 = proj.scale_factor;
        let lon0 = proj.central_meridian.to_radians();
        let lat0 = proj.latitude_of_origin.to_radians();

        let (sin, cos) = lat.sin_cos();
        let tan = lat.tan();
        let n = ellipsoid.semi_major_axis / (1.0 - e2 * sin * sin).sqrt();
        let t = tan * tan;
        let c = ep2 * cos * cos;
        let a = (lon - lon0) * cos;
        let (a2, a3) = (a * a, a * a * a);
        let (a4, a5, a6) = (a2 * a2, a2 * a3, a3 * a3);

        let easting = proj.false_easting
            + k0 * n
                * (a + (1.0 - t + c) * a3 / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0);
        let northing = proj.false_northing
            + k0 * (ellipsoid.meridional_arc(lat) - ellipsoid.meridional_arc(lat0)
                + n * tan
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        let result = GridPoint::new(easting, northing);
        if !result.is_finite() {
            return Err(GeodeticError::NonFinite("forward projection"));
        }
        Ok(result)
    }
}

/// Geographic (radians, h = 0) → geocentric XYZ.
fn geographic_to_geocentric(ellipsoid: &Ellipsoid, lon: f64, lat: f64) -> [f64; 3] {
    let n = ellipsoid.prime_vertical_radius(lat);
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    [
        n * cos_lat * cos_lon,
        n * cos_lat * sin_lon,
        n * (1.0 - ellipsoid.e2()) * sin_lat,
    ]
}

/// Geocentric XYZ → geographic (radians) using Bowring's auxiliary latitude.
fn geocentric_to_geographic(ellipsoid: &Ellipsoid, p: [f64; 3]) -> (f64, f64) {
    let a = ellipsoid.semi_major_axis;
    let b = ellipsoid.semi_minor_axis();
    let [x, y, z] = p;

    let horizontal = x.hypot(y);
    let theta = (z * a).atan2(horizontal * b);
    let (sin_t, cos_t) = theta.sin_cos();

    let lon = y.atan2(x);
    let lat = (z + ellipsoid.ep2() * b * sin_t.powi(3))
        .atan2(horizontal - ellipsoid.e2() * a * cos_t.powi(3));
    (lon, lat)
}
