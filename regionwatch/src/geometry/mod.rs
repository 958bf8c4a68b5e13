//! Geometry adapter
//!
//! Converts between stored point/polygon representations (GeoJSON shapes and
//! WKT literals) and the neutral coordinate types used everywhere else, and
//! provides the single containment predicate the rest of the crate relies on.
//!
//! # Planar containment
//!
//! [`contains`] evaluates point-in-polygon directly on longitude/latitude
//! pairs with no reprojection. Near the antimeridian (±180°) or the poles this
//! is geometrically unsound; a region spanning the antimeridian must be split
//! into two rings by whoever defines it.
//!
//! Points lying exactly on a ring edge or vertex are **outside**. This rule is
//! applied by every caller because every caller goes through [`contains`].

pub mod geojson;
mod types;
pub mod wkt;

pub use types::{
    BoundingBox, GeoPoint, GeometryError, LineString, Polygon, MAX_LAT, MAX_LON, MIN_LAT,
    MIN_LON, MIN_POLYGON_VERTICES, SRID_WGS84,
};

/// Distance in degrees within which a point counts as lying on an edge.
const EDGE_EPSILON: f64 = 1e-12;

/// Test whether `point` lies strictly inside `polygon`.
///
/// # Errors
///
/// Returns the validation error if the polygon cannot be evaluated
/// (fewer than three distinct vertices, non-finite coordinates, zero area).
pub fn contains(polygon: &Polygon, point: &GeoPoint) -> Result<bool, GeometryError> {
    polygon.validate()?;
    Ok(contains_unchecked(polygon, point))
}

/// Even-odd ray casting against an already validated polygon.
pub(crate) fn contains_unchecked(polygon: &Polygon, point: &GeoPoint) -> bool {
    if polygon.edges().any(|(a, b)| on_segment(a, b, point)) {
        return false;
    }

    let mut inside = false;
    for (a, b) in polygon.edges() {
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let crossing_lon = (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if point.lon < crossing_lon {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(a: GeoPoint, b: GeoPoint, p: &GeoPoint) -> bool {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (p.lon - a.lon).hypot(p.lat - a.lat) <= EDGE_EPSILON;
    }
    // Perpendicular distance to the edge's line, independent of edge length
    let cross = dx * (p.lat - a.lat) - dy * (p.lon - a.lon);
    if cross.abs() / length > EDGE_EPSILON {
        return false;
    }
    p.lon >= a.lon.min(b.lon) - EDGE_EPSILON
        && p.lon <= a.lon.max(b.lon) + EDGE_EPSILON
        && p.lat >= a.lat.min(b.lat) - EDGE_EPSILON
        && p.lat <= a.lat.max(b.lat) + EDGE_EPSILON
}
