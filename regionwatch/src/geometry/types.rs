//! Core geometry types: points, polygons, lines and bounding boxes.
//!
//! All coordinates are planar longitude/latitude pairs in degrees (WGS84,
//! SRID 4326). No reprojection is ever performed.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Spatial reference identifier for WGS84 geographic coordinates.
pub const SRID_WGS84: u32 = 4326;

/// Minimum number of distinct vertices for an evaluable polygon ring.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Errors produced when decoding or evaluating geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Latitude outside -90..=90.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude outside -180..=180.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// NaN or infinite coordinate.
    #[error("Coordinate is not a finite number")]
    NonFiniteCoordinate,

    /// Ring has fewer than three distinct vertices.
    #[error("Polygon ring has {distinct} distinct vertices (need at least 3)")]
    TooFewVertices { distinct: usize },

    /// Ring encloses zero area (all vertices collinear).
    #[error("Polygon ring is degenerate (zero area)")]
    Degenerate,

    /// Geometry literal has the wrong shape type.
    #[error("Expected {expected} geometry, found {found}")]
    UnexpectedType { expected: &'static str, found: String },

    /// Geometry literal could not be parsed.
    #[error("Malformed geometry: {0}")]
    Malformed(String),
}

/// A single geographic position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in degrees (x).
    pub lon: f64,
    /// Latitude in degrees (y).
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point without range checks.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn checked(lon: f64, lat: f64) -> Result<Self, GeometryError> {
        let point = Self { lon, lat };
        point.validate()?;
        Ok(point)
    }

    /// Check that both coordinates are finite and in range.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.lon.is_finite() || !self.lat.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate);
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(GeometryError::InvalidLatitude(self.lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(GeometryError::InvalidLongitude(self.lon));
        }
        Ok(())
    }

    /// Coordinates as a `[lon, lat]` pair.
    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lon, self.lat)
    }
}

/// A simple polygon described by its exterior ring.
///
/// The ring is always stored closed: the last vertex repeats the first.
/// Construction never validates; call [`Polygon::validate`] (or
/// [`super::contains`], which does) before relying on the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<GeoPoint>,
}

impl Polygon {
    /// Build a polygon from ordered vertices, closing the ring if needed.
    pub fn new(vertices: Vec<GeoPoint>) -> Self {
        let mut ring = vertices;
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self { ring }
    }

    /// Build a polygon from `(lon, lat)` pairs.
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|&(lon, lat)| GeoPoint::new(lon, lat))
                .collect(),
        )
    }

    /// The closed exterior ring (first vertex repeated at the end).
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// The ring's edges as consecutive vertex pairs.
    pub fn edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        self.ring.windows(2).map(|w| (w[0], w[1]))
    }

    /// Check that the ring can be evaluated for containment.
    ///
    /// Self-intersection is not detected; simple rings are assumed.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self
            .ring
            .iter()
            .any(|p| !p.lon.is_finite() || !p.lat.is_finite())
        {
            return Err(GeometryError::NonFiniteCoordinate);
        }

        let open = match self.ring.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        };
        // Adding 0.0 folds -0.0 into 0.0 so both sort as one vertex
        let mut keys: Vec<(u64, u64)> = open
            .iter()
            .map(|p| ((p.lon + 0.0).to_bits(), (p.lat + 0.0).to_bits()))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.len() < MIN_POLYGON_VERTICES {
            return Err(GeometryError::TooFewVertices {
                distinct: keys.len(),
            });
        }

        if self.signed_area() == 0.0 {
            return Err(GeometryError::Degenerate);
        }
        Ok(())
    }

    /// Shoelace signed area in square degrees (positive when counter-clockwise).
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a.lon * b.lat - b.lon * a.lat)
            .sum::<f64>()
            / 2.0
    }

    /// Axis-aligned bounding box of the ring, `None` for an empty ring.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.ring.first()?;
        let mut bbox = BoundingBox {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for p in &self.ring[1..] {
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
        }
        Some(bbox)
    }
}

/// An ordered sequence of points rendered as a connected line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineString {
    points: Vec<GeoPoint>,
}

impl LineString {
    /// Create a line through the given points, in order.
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// Points along the line.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the line has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis-aligned rectangle in longitude/latitude space.
///
/// Parsed from and displayed as `minLon,minLat,maxLon,maxLat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge.
    pub min_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting inverted or out-of-range edges.
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, GeometryError> {
        GeoPoint::checked(min_lon, min_lat)?;
        GeoPoint::checked(max_lon, max_lat)?;
        if min_lon > max_lon || min_lat > max_lat {
            return Err(GeometryError::Malformed(format!(
                "bounding box minimum ({}, {}) exceeds maximum ({}, {})",
                min_lon, min_lat, max_lon, max_lat
            )));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// True when the point lies inside or on the edge of the box.
    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }

    /// The box as a closed, counter-clockwise polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_coords(&[
            (self.min_lon, self.min_lat),
            (self.max_lon, self.min_lat),
            (self.max_lon, self.max_lat),
            (self.min_lon, self.max_lat),
        ])
    }
}

impl FromStr for BoundingBox {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeometryError::Malformed(format!(
                "bounding box '{}' must have 4 comma-separated values",
                s
            )));
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                GeometryError::Malformed(format!("bounding box value '{}' is not a number", part))
            })?;
        }
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}
