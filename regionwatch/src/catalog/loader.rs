//! GeoJSON FeatureCollection parsing for the region catalog.
//!
//! Each feature becomes one region:
//!
//! - `id`: the feature's `id` member, or `properties.id` (non-negative integer)
//! - `name`: `properties.name` (required)
//! - `region_type`: `properties.region_type` (required)
//! - `boundary`: the feature's `Polygon` geometry
//! - remaining properties are kept verbatim as region properties

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::geometry::geojson::polygon_from_geojson;
use crate::geometry::GeometryError;
use crate::model::{Attributes, Region, RegionId};

/// Errors loading a region catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not a FeatureCollection.
    #[error("expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// A feature is missing a required member or has the wrong shape.
    #[error("feature {index}: {reason}")]
    Feature { index: usize, reason: String },

    /// A feature's geometry could not be decoded.
    #[error("feature {index}: {source}")]
    Geometry {
        index: usize,
        source: GeometryError,
    },

    /// Two features share an id.
    #[error("duplicate region id {0}")]
    DuplicateId(RegionId),
}

/// Parse a GeoJSON FeatureCollection into regions, in document order.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Region>, CatalogError> {
    let document: Value = serde_json::from_str(text)?;
    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(CatalogError::NotFeatureCollection);
    }
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or(CatalogError::NotFeatureCollection)?;

    let mut seen = HashSet::new();
    let mut regions = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        let region = parse_feature(index, feature)?;
        if !seen.insert(region.id) {
            return Err(CatalogError::DuplicateId(region.id));
        }
        regions.push(region);
    }
    Ok(regions)
}

fn parse_feature(index: usize, feature: &Value) -> Result<Region, CatalogError> {
    let fail = |reason: &str| CatalogError::Feature {
        index,
        reason: reason.to_string(),
    };

    let mut properties: Attributes = match feature.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => Attributes::new(),
        Some(_) => return Err(fail("properties must be an object")),
    };

    let id = feature
        .get("id")
        .cloned()
        .or_else(|| properties.remove("id"))
        .ok_or_else(|| fail("missing id"))?
        .as_u64()
        .ok_or_else(|| fail("id must be a non-negative integer"))?;
    properties.remove("id");

    let name = take_string(&mut properties, "name").ok_or_else(|| fail("missing properties.name"))?;
    let region_type = take_string(&mut properties, "region_type")
        .ok_or_else(|| fail("missing properties.region_type"))?;

    let geometry = feature.get("geometry").ok_or_else(|| fail("missing geometry"))?;
    let boundary =
        polygon_from_geojson(geometry).map_err(|source| CatalogError::Geometry { index, source })?;

    Ok(Region::new(RegionId(id), name, region_type, boundary).with_properties(properties))
}

fn take_string(properties: &mut Attributes, key: &str) -> Option<String> {
    match properties.remove(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_REGIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 2,
             "properties": {"name": "Harbour", "region_type": "PORT", "authority": "PA"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,10],[10,10],[10,0],[0,0]]]}},
            {"type": "Feature",
             "properties": {"id": 1, "name": "Airspace", "region_type": "CTR"},
             "geometry": {"type": "Polygon", "coordinates": [[[20,20],[20,30],[30,30],[30,20],[20,20]]]}}
        ]
    }"#;

    #[test]
    fn test_parse_two_regions() {
        let regions = parse_feature_collection(TWO_REGIONS).unwrap();
        assert_eq!(regions.len(), 2);

        assert_eq!(regions[0].id, RegionId(2));
        assert_eq!(regions[0].name, "Harbour");
        assert_eq!(regions[0].properties["authority"], "PA");
        assert!(!regions[0].properties.contains_key("name"));

        assert_eq!(regions[1].id, RegionId(1));
        assert_eq!(regions[1].region_type, "CTR");
        assert!(regions[1].properties.is_empty());
    }

    #[test]
    fn test_not_a_feature_collection() {
        let result = parse_feature_collection(r#"{"type": "Feature"}"#);
        assert!(matches!(result, Err(CatalogError::NotFeatureCollection)));
    }

    #[test]
    fn test_missing_name() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 1, "properties": {"region_type": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text),
            Err(CatalogError::Feature { index: 0, .. })
        ));
    }

    #[test]
    fn test_wrong_geometry_type() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 1, "properties": {"name": "P", "region_type": "X"},
             "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text),
            Err(CatalogError::Geometry { index: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_ids() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 1, "properties": {"name": "A", "region_type": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[0,0]]]}},
            {"type": "Feature", "id": 1, "properties": {"name": "B", "region_type": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text),
            Err(CatalogError::DuplicateId(RegionId(1)))
        ));
    }

    #[test]
    fn test_degenerate_boundary_still_loads() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 5, "properties": {"name": "Broken", "region_type": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,1]]]}}
        ]}"#;
        let regions = parse_feature_collection(text).unwrap();
        assert!(regions[0].boundary.validate().is_err());
    }
}
