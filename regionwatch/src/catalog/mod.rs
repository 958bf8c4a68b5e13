//! Region catalog
//!
//! Holds the current set of named regions. The catalog is read-mostly: the
//! detector and query engine read it on every call, while population happens
//! out of band (a GeoJSON file at startup, or an explicit [`RegionCatalog::populate`]).
//!
//! # Thread Safety
//!
//! The region map sits behind an `Arc` that is swapped under a brief
//! `RwLock` write. [`RegionCatalog::snapshot`] hands out the current `Arc`,
//! so a detection pass evaluates one consistent catalog even if the catalog
//! is repopulated halfway through.
//!
//! Each boundary is validated once, when its region enters the catalog. The
//! outcome and the bounding box are kept in the [`CatalogEntry`] so detection
//! never re-walks a ring to decide whether it can be evaluated.

mod loader;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::NotFound;
use crate::geometry::{BoundingBox, GeometryError};
use crate::model::{Region, RegionId};

pub use loader::{parse_feature_collection, CatalogError};

/// Immutable view of the catalog at one instant, ordered by region id.
pub type CatalogSnapshot = Arc<BTreeMap<RegionId, CatalogEntry>>;

/// A region together with the result of validating its boundary.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub region: Arc<Region>,
    /// `Err` when the boundary cannot be evaluated.
    pub boundary_check: Result<(), GeometryError>,
    /// Bounding box of an evaluable boundary.
    pub bbox: Option<BoundingBox>,
}

impl CatalogEntry {
    pub fn new(region: Region) -> Self {
        let boundary_check = region.boundary.validate();
        let bbox = match boundary_check {
            Ok(()) => region.boundary.bounding_box(),
            Err(_) => None,
        };
        Self {
            region: Arc::new(region),
            boundary_check,
            bbox,
        }
    }
}

/// The current set of regions.
#[derive(Default)]
pub struct RegionCatalog {
    regions: RwLock<CatalogSnapshot>,
}

impl RegionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given regions.
    pub fn from_regions(regions: impl IntoIterator<Item = Region>) -> Self {
        let catalog = Self::new();
        catalog.populate(regions);
        catalog
    }

    /// Load a catalog from a GeoJSON FeatureCollection file.
    ///
    /// Regions whose boundary cannot be evaluated are still loaded (and
    /// logged); detection skips them per report.
    pub fn load_geojson(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_regions(parse_feature_collection(&text)?);
        for entry in catalog.snapshot().values() {
            if let Err(e) = &entry.boundary_check {
                let region = &entry.region;
                warn!(region_id = %region.id, name = %region.name, error = %e, "Region boundary cannot be evaluated");
            }
        }
        info!(path = %path.display(), count = catalog.len(), "Loaded region catalog");
        Ok(catalog)
    }

    /// All regions in ascending id order.
    pub fn list_regions(&self) -> Vec<Arc<Region>> {
        self.snapshot()
            .values()
            .map(|entry| Arc::clone(&entry.region))
            .collect()
    }

    /// Look up one region.
    pub fn get_region(&self, id: RegionId) -> Result<Arc<Region>, NotFound> {
        self.regions
            .read()
            .get(&id)
            .map(|entry| Arc::clone(&entry.region))
            .ok_or(NotFound::Region(id))
    }

    /// The current catalog contents.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.regions.read().clone()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.read().len()
    }

    /// True when no regions are loaded.
    pub fn is_empty(&self) -> bool {
        self.regions.read().is_empty()
    }

    /// Replace the entire catalog atomically.
    ///
    /// The new map is built outside the lock; readers see either the old or
    /// the new catalog, never a mix. A later region with a duplicate id wins.
    pub fn populate(&self, regions: impl IntoIterator<Item = Region>) {
        let map: BTreeMap<RegionId, CatalogEntry> = regions
            .into_iter()
            .map(|region| (region.id, CatalogEntry::new(region)))
            .collect();
        *self.regions.write() = Arc::new(map);
    }

    /// Insert or replace a single region.
    pub fn upsert(&self, region: Region) {
        let entry = CatalogEntry::new(region);
        let mut guard = self.regions.write();
        let mut map = (**guard).clone();
        map.insert(entry.region.id, entry);
        *guard = Arc::new(map);
    }

    /// Remove a region, returning it if present.
    pub fn remove(&self, id: RegionId) -> Option<Arc<Region>> {
        let mut guard = self.regions.write();
        if !guard.contains_key(&id) {
            return None;
        }
        let mut map = (**guard).clone();
        let removed = map.remove(&id);
        *guard = Arc::new(map);
        removed.map(|entry| entry.region)
    }
}
