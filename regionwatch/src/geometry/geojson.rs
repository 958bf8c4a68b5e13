//! GeoJSON encoding and decoding for points, polygons and lines.
//!
//! Shapes are exchanged as `{"type": "Point", "coordinates": [lon, lat]}`,
//! `{"type": "Polygon", "coordinates": [[[lon, lat], ...]]}` and
//! `{"type": "LineString", "coordinates": [[lon, lat], ...]}`. Only the
//! exterior ring of a polygon is used; interior rings are rejected.
//!
//! [`GeoPoint`], [`Polygon`] and [`LineString`] implement `Serialize` and
//! `Deserialize` through these shapes, so any serde format sees GeoJSON.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use super::types::{GeoPoint, GeometryError, LineString, Polygon};

/// Encode a point as a GeoJSON `Point`.
pub fn point_to_geojson(point: &GeoPoint) -> Value {
    json!({ "type": "Point", "coordinates": point.to_array() })
}

/// Decode a GeoJSON `Point`.
pub fn point_from_geojson(value: &Value) -> Result<GeoPoint, GeometryError> {
    let coords = shape_coordinates(value, "Point")?;
    position(coords)
}

/// Encode a polygon as a GeoJSON `Polygon` with a single closed ring.
pub fn polygon_to_geojson(polygon: &Polygon) -> Value {
    let ring: Vec<[f64; 2]> = polygon.ring().iter().map(|p| p.to_array()).collect();
    json!({ "type": "Polygon", "coordinates": [ring] })
}

/// Decode a GeoJSON `Polygon` (exterior ring only).
pub fn polygon_from_geojson(value: &Value) -> Result<Polygon, GeometryError> {
    let coords = shape_coordinates(value, "Polygon")?;
    let rings = coords
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("polygon coordinates must be an array".into()))?;
    match rings.as_slice() {
        [exterior] => Ok(Polygon::new(positions(exterior)?)),
        [] => Err(GeometryError::Malformed("polygon has no rings".into())),
        _ => Err(GeometryError::Malformed(format!(
            "polygon has {} rings; holes are not supported",
            rings.len()
        ))),
    }
}

/// Encode a line as a GeoJSON `LineString`.
pub fn line_to_geojson(line: &LineString) -> Value {
    let coords: Vec<[f64; 2]> = line.points().iter().map(|p| p.to_array()).collect();
    json!({ "type": "LineString", "coordinates": coords })
}

/// Decode a GeoJSON `LineString`.
pub fn line_from_geojson(value: &Value) -> Result<LineString, GeometryError> {
    let coords = shape_coordinates(value, "LineString")?;
    Ok(LineString::new(positions(coords)?))
}

fn shape_coordinates<'a>(
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a Value, GeometryError> {
    let found = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::Malformed("missing geometry type".into()))?;
    if found != expected {
        return Err(GeometryError::UnexpectedType {
            expected,
            found: found.to_string(),
        });
    }
    value
        .get("coordinates")
        .ok_or_else(|| GeometryError::Malformed("missing coordinates".into()))
}

fn position(value: &Value) -> Result<GeoPoint, GeometryError> {
    let pair = value
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("position must be an array".into()))?;
    // Extra ordinates (altitude) are ignored
    if pair.len() < 2 {
        return Err(GeometryError::Malformed(format!(
            "position has {} ordinates, need 2",
            pair.len()
        )));
    }
    let lon = pair[0]
        .as_f64()
        .ok_or_else(|| GeometryError::Malformed("longitude is not a number".into()))?;
    let lat = pair[1]
        .as_f64()
        .ok_or_else(|| GeometryError::Malformed("latitude is not a number".into()))?;
    Ok(GeoPoint::new(lon, lat))
}

fn positions(value: &Value) -> Result<Vec<GeoPoint>, GeometryError> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::Malformed("positions must be an array".into()))?
        .iter()
        .map(position)
        .collect()
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        point_to_geojson(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        point_from_geojson(&value).map_err(D::Error::custom)
    }
}

impl Serialize for Polygon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        polygon_to_geojson(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Polygon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        polygon_from_geojson(&value).map_err(D::Error::custom)
    }
}

impl Serialize for LineString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        line_to_geojson(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LineString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        line_from_geojson(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_shape() {
        let value = point_to_geojson(&GeoPoint::new(4.5, 51.9));
        assert_eq!(value, json!({"type": "Point", "coordinates": [4.5, 51.9]}));
    }

    #[test]
    fn test_point_decode_ignores_altitude() {
        let value = json!({"type": "Point", "coordinates": [1.0, 2.0, 300.0]});
        assert_eq!(point_from_geojson(&value).unwrap(), GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_polygon_shape_is_closed_ring() {
        let polygon = Polygon::from_coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let value = polygon_to_geojson(&polygon);
        let ring = value["coordinates"][0].as_array().unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn test_polygon_with_hole_rejected() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[2, 2], [3, 2], [3, 3], [2, 2]]
            ]
        });
        assert!(matches!(
            polygon_from_geojson(&value),
            Err(GeometryError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let value = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert!(matches!(
            polygon_from_geojson(&value),
            Err(GeometryError::UnexpectedType { expected: "Polygon", .. })
        ));
    }

    #[test]
    fn test_missing_coordinates_rejected() {
        let value = json!({"type": "LineString"});
        assert!(line_from_geojson(&value).is_err());
    }

    #[test]
    fn test_line_shape() {
        let line = LineString::new(vec![GeoPoint::new(5.0, 5.0), GeoPoint::new(15.0, 5.0)]);
        assert_eq!(
            line_to_geojson(&line),
            json!({"type": "LineString", "coordinates": [[5.0, 5.0], [15.0, 5.0]]})
        );
    }

    #[test]
    fn test_serde_uses_geojson() {
        let point = GeoPoint::new(-74.006, 40.7128);
        let text = serde_json::to_string(&point).unwrap();
        assert!(text.contains("\"type\":\"Point\""));
        let back: GeoPoint = serde_json::from_str(&text).unwrap();
        assert_eq!(back, point);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_polygon_roundtrip_preserves_vertex_order(
                coords in prop::collection::vec((-180.0..180.0_f64, -90.0..90.0_f64), 3..12)
            ) {
                let polygon = Polygon::from_coords(&coords);
                let decoded = polygon_from_geojson(&polygon_to_geojson(&polygon)).unwrap();
                prop_assert_eq!(decoded.ring(), polygon.ring());
            }

            #[test]
            fn test_point_roundtrip(lon in -180.0..180.0_f64, lat in -90.0..90.0_f64) {
                let point = GeoPoint::new(lon, lat);
                prop_assert_eq!(point_from_geojson(&point_to_geojson(&point)).unwrap(), point);
            }
        }
    }
}
