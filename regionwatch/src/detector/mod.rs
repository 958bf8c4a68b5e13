//! Crossing detector
//!
//! Given an asset's previous report (if any) and its new report, evaluates
//! containment of both positions against every region and emits an ENTRY or
//! EXIT for each region whose containment changed.
//!
//! # Rules
//!
//! - **Cold start**: with no previous report, nothing is emitted.
//! - **Order**: regions are evaluated in ascending id order; emitted
//!   crossings follow that order.
//! - **Fail open per region**: a region whose boundary cannot be evaluated
//!   is skipped and reported in [`Detection::skipped`]; every other region
//!   is still evaluated.
//!
//! # Bounding-box pre-filter
//!
//! With [`DetectorConfig::bbox_prefilter`] enabled, a region is skipped
//! without running the full containment test when neither position lies in
//! its bounding box. A point strictly inside a polygon is always inside its
//! bounding box, so the pre-filter never changes which crossings fire.
//!
//! Boundary validity and bounding boxes come from the [`CatalogEntry`], where
//! they were computed once when the region was loaded.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::catalog::{CatalogEntry, CatalogSnapshot};
use crate::geometry::{contains_unchecked, GeoPoint, GeometryError};
use crate::model::{CrossingType, NewCrossing, RegionId};

/// Detector tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Skip regions whose bounding box contains neither position.
    pub bbox_prefilter: bool,
}

/// A crossing produced by detection, with the region's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedCrossing {
    pub crossing: NewCrossing,
    pub region_name: String,
}

/// A region left out of a detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRegion {
    pub region_id: RegionId,
    pub region_name: String,
    pub error: GeometryError,
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Crossings in ascending region-id order.
    pub crossings: Vec<DetectedCrossing>,
    /// Regions whose boundary could not be evaluated.
    pub skipped: Vec<SkippedRegion>,
}

impl Detection {
    /// True when no crossings fired.
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }
}

/// The position being evaluated: who, when and where.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub asset_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
}

/// Stateless region-crossing detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingDetector {
    config: DetectorConfig,
}

impl CrossingDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Compare `previous` and `current` against every region in `regions`.
    pub fn detect(
        &self,
        previous: Option<GeoPoint>,
        current: Observation<'_>,
        regions: &CatalogSnapshot,
    ) -> Detection {
        let mut detection = Detection::default();

        let Some(previous) = previous else {
            debug!(asset_id = current.asset_id, "Cold start, no crossings inferred");
            return detection;
        };

        for entry in regions.values() {
            let region = &entry.region;
            match self.transition(entry, &previous, &current.location) {
                Ok(Some(crossing_type)) => {
                    debug!(
                        asset_id = current.asset_id,
                        region_id = %region.id,
                        crossing = %crossing_type,
                        "Region crossing detected"
                    );
                    detection.crossings.push(DetectedCrossing {
                        crossing: NewCrossing {
                            asset_id: current.asset_id.to_string(),
                            region_id: region.id,
                            crossing_type,
                            crossing_time: current.timestamp,
                            position: current.location,
                        },
                        region_name: region.name.clone(),
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        region_id = %region.id,
                        name = %region.name,
                        error = %error,
                        "Skipping region with invalid geometry"
                    );
                    detection.skipped.push(SkippedRegion {
                        region_id: region.id,
                        region_name: region.name.clone(),
                        error,
                    });
                }
            }
        }

        detection
    }

    fn transition(
        &self,
        entry: &CatalogEntry,
        previous: &GeoPoint,
        current: &GeoPoint,
    ) -> Result<Option<CrossingType>, GeometryError> {
        entry.boundary_check.clone()?;

        if self.config.bbox_prefilter {
            if let Some(bbox) = &entry.bbox {
                if !bbox.contains_point(previous) && !bbox.contains_point(current) {
                    return Ok(None);
                }
            }
        }

        let boundary = &entry.region.boundary;
        let was_in = contains_unchecked(boundary, previous);
        let is_in = contains_unchecked(boundary, current);
        Ok(CrossingType::from_transition(was_in, is_in))
    }
}
