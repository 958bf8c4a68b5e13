//! Named geographic regions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Attributes;
use crate::geometry::Polygon;

/// Stable identity of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named region with a polygon boundary.
///
/// The boundary is expected to be a simple closed ring. Regions are read-only
/// from the detector's point of view; they are populated out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub region_type: String,
    /// Serialized as a GeoJSON `Polygon`.
    pub boundary: Polygon,
    #[serde(default)]
    pub properties: Attributes,
}

impl Region {
    /// Create a region with no extra properties.
    pub fn new(
        id: RegionId,
        name: impl Into<String>,
        region_type: impl Into<String>,
        boundary: Polygon,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            region_type: region_type.into(),
            boundary,
            properties: Attributes::new(),
        }
    }

    /// Attach arbitrary properties.
    pub fn with_properties(mut self, properties: Attributes) -> Self {
        self.properties = properties;
        self
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.id, self.name, self.region_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_serializes_boundary_as_polygon() {
        let region = Region::new(
            RegionId(1),
            "Harbour",
            "PORT",
            Polygon::from_coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]),
        );
        let value = serde_json::to_value(&region).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["boundary"]["type"], "Polygon");
        assert_eq!(value["boundary"]["coordinates"][0].as_array().unwrap().len(), 5);

        let back: Region = serde_json::from_value(value).unwrap();
        assert_eq!(back, region);
    }

    #[test]
    fn test_region_display() {
        let region = Region::new(RegionId(3), "North Sea", "EEZ", Polygon::new(Vec::new()));
        assert_eq!(region.to_string(), "3 'North Sea' (EEZ)");
    }
}
