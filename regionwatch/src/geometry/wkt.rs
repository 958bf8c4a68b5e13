//! Well-Known Text literals for points and polygons.
//!
//! Storage collaborators exchange geometry as `POINT(lon lat)` and
//! `POLYGON((lon lat, lon lat, ...))`. An optional EWKT `SRID=4326;` prefix
//! is accepted on input; any other SRID is rejected.

use super::types::{GeoPoint, GeometryError, Polygon, SRID_WGS84};

/// Encode a point as `POINT(lon lat)`.
pub fn point_to_wkt(point: &GeoPoint) -> String {
    format!("POINT({} {})", point.lon, point.lat)
}

/// Encode a polygon as `POLYGON((...))` with its closed exterior ring.
pub fn polygon_to_wkt(polygon: &Polygon) -> String {
    let ring: Vec<String> = polygon
        .ring()
        .iter()
        .map(|p| format!("{} {}", p.lon, p.lat))
        .collect();
    format!("POLYGON(({}))", ring.join(", "))
}

/// Decode a `POINT(lon lat)` literal.
pub fn point_from_wkt(text: &str) -> Result<GeoPoint, GeometryError> {
    let body = tagged_body(text, "POINT")?;
    let inner = strip_parens(body)?;
    parse_position(inner)
}

/// Decode a `POLYGON((...))` literal (exterior ring only).
pub fn polygon_from_wkt(text: &str) -> Result<Polygon, GeometryError> {
    let body = tagged_body(text, "POLYGON")?;
    let rings = strip_parens(body)?;
    let ring = strip_parens(rings)?;
    if ring.contains('(') || ring.contains(')') {
        return Err(GeometryError::Malformed(
            "polygon holes are not supported".into(),
        ));
    }
    let vertices = ring
        .split(',')
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(vertices))
}

/// Strip an optional SRID prefix and the shape tag, returning the remainder.
fn tagged_body<'a>(text: &'a str, tag: &'static str) -> Result<&'a str, GeometryError> {
    let mut text = text.trim();

    if let Some((prefix, rest)) = text.split_once(';') {
        let srid = prefix
            .trim()
            .strip_prefix("SRID=")
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| GeometryError::Malformed(format!("invalid SRID prefix '{}'", prefix)))?;
        if srid != SRID_WGS84 {
            return Err(GeometryError::Malformed(format!(
                "unsupported SRID {} (expected {})",
                srid, SRID_WGS84
            )));
        }
        text = rest.trim();
    }

    let split = text.find('(').unwrap_or(text.len());
    let (found, body) = text.split_at(split);
    let found = found.trim();
    if !found.eq_ignore_ascii_case(tag) {
        return Err(GeometryError::UnexpectedType {
            expected: tag,
            found: found.to_string(),
        });
    }
    Ok(body)
}

fn strip_parens(text: &str) -> Result<&str, GeometryError> {
    text.trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .map(str::trim)
        .ok_or_else(|| GeometryError::Malformed(format!("unbalanced parentheses in '{}'", text)))
}

fn parse_position(text: &str) -> Result<GeoPoint, GeometryError> {
    let mut parts = text.split_whitespace();
    let mut next = |name: &str| -> Result<f64, GeometryError> {
        let raw = parts
            .next()
            .ok_or_else(|| GeometryError::Malformed(format!("missing {} in '{}'", name, text)))?;
        raw.parse()
            .map_err(|_| GeometryError::Malformed(format!("{} '{}' is not a number", name, raw)))
    };
    let lon = next("longitude")?;
    let lat = next("latitude")?;
    Ok(GeoPoint::new(lon, lat))
}
