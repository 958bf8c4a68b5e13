//! Query filters evaluated by track stores.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::geometry::{contains_unchecked, BoundingBox, GeometryError, Polygon};
use crate::model::{AssetType, PositionReport, RegionCrossing, RegionId};

/// Inclusive time window; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ValidationError::TimeRange {
                    start: s.to_rfc3339(),
                    end: e.to_rfc3339(),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// True when `t` lies within the range (bounds inclusive).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t <= e)
    }
}

/// Result ordering by timestamp (ties broken by id in the same direction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Criteria for selecting position reports (AND semantics).
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    asset_id: Option<String>,
    asset_type: Option<AssetType>,
    time: TimeRange,
    within: Option<Polygon>,
    bbox: Option<BoundingBox>,
    order: SortOrder,
    limit: Option<usize>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    pub fn time(mut self, time: TimeRange) -> Self {
        self.time = time;
        self
    }

    /// Keep only reports strictly inside `polygon`.
    ///
    /// The polygon is validated here so matching never fails.
    pub fn within(mut self, polygon: Polygon) -> Result<Self, GeometryError> {
        polygon.validate()?;
        self.within = Some(polygon);
        Ok(self)
    }

    /// Keep only reports inside or on the edge of `bbox`.
    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset_id.as_deref()
    }

    /// True when `report` satisfies every criterion.
    pub fn matches(&self, report: &PositionReport) -> bool {
        if let Some(asset_id) = &self.asset_id {
            if &report.asset_id != asset_id {
                return false;
            }
        }
        if let Some(asset_type) = &self.asset_type {
            if &report.asset_type != asset_type {
                return false;
            }
        }
        if !self.time.contains(report.timestamp) {
            return false;
        }
        if let Some(bbox) = &self.bbox {
            if !bbox.contains_point(&report.location) {
                return false;
            }
        }
        if let Some(polygon) = &self.within {
            if !contains_unchecked(polygon, &report.location) {
                return false;
            }
        }
        true
    }
}

/// Criteria for selecting crossings (AND semantics), newest first.
#[derive(Debug, Clone, Default)]
pub struct CrossingFilter {
    asset_id: Option<String>,
    region_id: Option<RegionId>,
    time: TimeRange,
}

impl CrossingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn region_id(mut self, region_id: RegionId) -> Self {
        self.region_id = Some(region_id);
        self
    }

    pub fn time(mut self, time: TimeRange) -> Self {
        self.time = time;
        self
    }

    pub fn matches(&self, crossing: &RegionCrossing) -> bool {
        self.asset_id
            .as_ref()
            .map_or(true, |id| &crossing.asset_id == id)
            && self.region_id.map_or(true, |id| crossing.region_id == id)
            && self.time.contains(crossing.crossing_time)
    }
}
