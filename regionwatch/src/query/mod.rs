//! Query engine
//!
//! Read-only, composable queries over stored reports, tracks, regions and
//! crossing history. Queries take no exclusive locks and may run alongside
//! ingestion; the store guarantees they never observe a report without its
//! crossings.
//!
//! A `region_id` filter is evaluated against the region's **current**
//! boundary, not the boundary in force when each report was recorded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::catalog::RegionCatalog;
use crate::error::{NotFound, TrackingResult, ValidationError};
use crate::geometry::{BoundingBox, LineString};
use crate::model::{
    AssetType, PositionReport, Region, RegionCrossing, RegionId, ReportId,
};
use crate::store::{CrossingFilter, ReportFilter, SortOrder, TimeRange, TrackStore};

/// Limit applied when a positions query does not name one.
pub const DEFAULT_LIMIT: usize = 100;

/// Largest accepted positions limit.
pub const MAX_LIMIT: usize = 1000;

/// Result-size limits for position queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Parse an RFC 3339 timestamp supplied as a filter.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ValidationError::Timestamp(text.to_string()))
}

/// A text filter with surrounding whitespace removed; blank counts as absent.
fn filter_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Filters for [`QueryEngine::query_positions`]. Every field is optional;
/// supplied fields combine with AND. Blank text filters are ignored.
#[derive(Debug, Clone, Default)]
pub struct PositionQuery {
    pub asset_id: Option<String>,
    pub asset_type: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub region_id: Option<RegionId>,
    /// `minLon,minLat,maxLon,maxLat`
    pub bbox: Option<String>,
    pub limit: Option<usize>,
}

/// Filters for [`QueryEngine::query_crossings`].
#[derive(Debug, Clone, Default)]
pub struct CrossingQuery {
    pub asset_id: Option<String>,
    pub region_id: Option<RegionId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// One row of a positions response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub id: ReportId,
    pub asset_id: String,
    pub asset_type: AssetType,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: Option<f64>,
    pub heading: Option<f64>,
}

impl From<PositionReport> for PositionSummary {
    fn from(report: PositionReport) -> Self {
        Self {
            id: report.id,
            asset_id: report.asset_id,
            asset_type: report.asset_type,
            timestamp: report.timestamp,
            latitude: report.location.lat,
            longitude: report.location.lon,
            speed_knots: report.speed_knots,
            heading: report.heading,
        }
    }
}

/// Positions response: newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionsPage {
    pub count: usize,
    pub positions: Vec<PositionSummary>,
}

/// An asset's track as a connected line, oldest point first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub asset_id: String,
    /// Type of the first report in the window.
    pub asset_type: AssetType,
    pub point_count: usize,
    /// Serialized as a GeoJSON `LineString`.
    pub track: LineString,
}

/// Read-side facade over the track store and region catalog.
pub struct QueryEngine<S: TrackStore + ?Sized> {
    store: Arc<S>,
    catalog: Arc<RegionCatalog>,
    settings: QuerySettings,
}

impl<S: TrackStore + ?Sized> QueryEngine<S> {
    pub fn new(store: Arc<S>, catalog: Arc<RegionCatalog>) -> Self {
        Self {
            store,
            catalog,
            settings: QuerySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> QuerySettings {
        self.settings
    }

    /// Reports matching every supplied filter, newest first, truncated to the
    /// limit.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed bbox, an inverted time range, or a limit
    ///   outside `1..=max_limit`.
    /// - `NotFound` when `region_id` names no region.
    /// - `InvalidGeometry` when that region's boundary cannot be evaluated.
    pub fn query_positions(&self, query: PositionQuery) -> TrackingResult<PositionsPage> {
        let limit = query.limit.unwrap_or(self.settings.default_limit);
        if limit == 0 || limit > self.settings.max_limit {
            return Err(ValidationError::Limit {
                limit,
                max: self.settings.max_limit,
            }
            .into());
        }

        let mut filter = ReportFilter::new()
            .time(TimeRange::new(query.start, query.end)?)
            .order(SortOrder::NewestFirst)
            .limit(limit);

        if let Some(asset_id) = filter_text(&query.asset_id) {
            filter = filter.asset_id(asset_id);
        }
        if let Some(asset_type) = filter_text(&query.asset_type) {
            filter = filter.asset_type(AssetType::new(asset_type));
        }
        if let Some(bbox) = filter_text(&query.bbox) {
            let bbox: BoundingBox = bbox.parse().map_err(ValidationError::BoundingBox)?;
            filter = filter.bbox(bbox);
        }
        if let Some(region_id) = query.region_id {
            let region = self.catalog.get_region(region_id)?;
            filter = filter.within(region.boundary.clone())?;
        }

        let positions: Vec<PositionSummary> = self
            .store
            .find_reports(&filter)?
            .into_iter()
            .map(PositionSummary::from)
            .collect();
        debug!(count = positions.len(), limit, "Positions query");

        Ok(PositionsPage {
            count: positions.len(),
            positions,
        })
    }

    /// All of an asset's reports in the window, oldest first, as a line.
    ///
    /// # Errors
    ///
    /// `NotFound` when no report matches.
    pub fn get_track(
        &self,
        asset_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> TrackingResult<Track> {
        let asset_id = asset_id.trim();
        let filter = ReportFilter::new()
            .asset_id(asset_id)
            .time(TimeRange::new(start, end)?)
            .order(SortOrder::OldestFirst);

        let reports = self.store.find_reports(&filter)?;
        let Some(first) = reports.first() else {
            return Err(NotFound::Track(asset_id.to_string()).into());
        };
        let asset_type = first.asset_type.clone();
        let points = reports.iter().map(|r| r.location).collect();
        debug!(asset_id, points = reports.len(), "Track query");

        Ok(Track {
            asset_id: asset_id.to_string(),
            asset_type,
            point_count: reports.len(),
            track: LineString::new(points),
        })
    }

    /// Every region, ascending by id.
    pub fn list_regions(&self) -> Vec<Arc<Region>> {
        self.catalog.list_regions()
    }

    /// One region by id.
    pub fn get_region(&self, id: RegionId) -> TrackingResult<Arc<Region>> {
        Ok(self.catalog.get_region(id)?)
    }

    /// Crossings matching every supplied filter, newest first.
    ///
    /// A `region_id` is matched against stored crossings only, so history for
    /// a region since removed from the catalog stays queryable.
    pub fn query_crossings(&self, query: CrossingQuery) -> TrackingResult<Vec<RegionCrossing>> {
        let mut filter = CrossingFilter::new().time(TimeRange::new(query.start, query.end)?);
        if let Some(asset_id) = filter_text(&query.asset_id) {
            filter = filter.asset_id(asset_id);
        }
        if let Some(region_id) = query.region_id {
            filter = filter.region_id(region_id);
        }

        let crossings = self.store.find_crossings(&filter)?;
        debug!(count = crossings.len(), "Crossings query");
        Ok(crossings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackingError;
    use crate::geometry::{GeoPoint, Polygon};
    use crate::model::{CrossingType, NewCrossing, RawPositionReport};
    use crate::store::{CommitRequest, MemoryStore};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn seeded() -> QueryEngine<MemoryStore> {
        let store = MemoryStore::new();
        for (asset, kind, hour, lon, lat) in [
            ("X1", "VESSEL", 1, 5.0, 5.0),
            ("X1", "VESSEL", 2, 20.0, 20.0),
            ("Y2", "AIRCRAFT", 3, 6.0, 6.0),
        ] {
            let report = RawPositionReport::new(asset, kind, at(hour), lon, lat)
                .validate()
                .unwrap();
            store.append(report).unwrap();
        }
        let catalog = RegionCatalog::from_regions([
            Region::new(
                RegionId(1),
                "Box",
                "ZONE",
                Polygon::from_coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]),
            ),
            Region::new(
                RegionId(9),
                "Broken",
                "ZONE",
                Polygon::from_coords(&[(0.0, 0.0), (1.0, 1.0)]),
            ),
        ]);
        QueryEngine::new(Arc::new(store), Arc::new(catalog))
    }

    #[test]
    fn test_bbox_filter() {
        let page = seeded()
            .query_positions(PositionQuery {
                bbox: Some("0,0,10,10".into()),
                asset_id: Some("X1".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.positions[0].longitude, 5.0);
        assert_eq!(page.positions[0].latitude, 5.0);
    }

    #[test]
    fn test_newest_first_and_limit() {
        let engine = seeded();
        let page = engine.query_positions(PositionQuery::default()).unwrap();
        let hours: Vec<_> = page.positions.iter().map(|p| p.timestamp).collect();
        assert_eq!(hours, vec![at(3), at(2), at(1)]);

        let page = engine
            .query_positions(PositionQuery {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.positions[0].asset_id, "Y2");
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let engine = seeded();
        for blank in ["", "   "] {
            let page = engine
                .query_positions(PositionQuery {
                    asset_id: Some(blank.into()),
                    asset_type: Some(blank.into()),
                    bbox: Some(blank.into()),
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(page.count, 3);

            let crossings = engine
                .query_crossings(CrossingQuery {
                    asset_id: Some(blank.into()),
                    ..Default::default()
                })
                .unwrap();
            assert!(crossings.is_empty());
        }

        let padded = engine
            .query_positions(PositionQuery {
                asset_id: Some(" Y2 ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(padded.count, 1);
    }

    #[test]
    fn test_asset_type_filter_is_case_insensitive() {
        let page = seeded()
            .query_positions(PositionQuery {
                asset_type: Some("aircraft".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.positions[0].asset_id, "Y2");
    }

    #[test]
    fn test_region_filter_uses_boundary() {
        let page = seeded()
            .query_positions(PositionQuery {
                region_id: Some(RegionId(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.count, 2);
        assert!(page.positions.iter().all(|p| p.longitude < 10.0));
    }

    #[test]
    fn test_query_errors() {
        let engine = seeded();

        let missing = engine.query_positions(PositionQuery {
            region_id: Some(RegionId(42)),
            ..Default::default()
        });
        assert_eq!(missing.unwrap_err().status_code(), 404);

        let broken = engine.query_positions(PositionQuery {
            region_id: Some(RegionId(9)),
            ..Default::default()
        });
        assert!(matches!(broken, Err(TrackingError::InvalidGeometry(_))));

        let bad_bbox = engine.query_positions(PositionQuery {
            bbox: Some("0,0,10".into()),
            ..Default::default()
        });
        assert!(matches!(
            bad_bbox,
            Err(TrackingError::Validation(ValidationError::BoundingBox(_)))
        ));

        let bad_range = engine.query_positions(PositionQuery {
            start: Some(at(5)),
            end: Some(at(1)),
            ..Default::default()
        });
        assert_eq!(bad_range.unwrap_err().status_code(), 400);

        for limit in [0, MAX_LIMIT + 1] {
            let result = engine.query_positions(PositionQuery {
                limit: Some(limit),
                ..Default::default()
            });
            assert!(matches!(
                result,
                Err(TrackingError::Validation(ValidationError::Limit { .. }))
            ));
        }
    }

    #[test]
    fn test_track_oldest_first() {
        let track = seeded().get_track("X1", None, None).unwrap();
        assert_eq!(track.point_count, 2);
        assert_eq!(track.asset_type.as_str(), "VESSEL");
        assert_eq!(
            track.track.points(),
            &[GeoPoint::new(5.0, 5.0), GeoPoint::new(20.0, 20.0)]
        );

        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["track"]["type"], "LineString");
    }

    #[test]
    fn test_track_not_found() {
        let engine = QueryEngine::new(Arc::new(MemoryStore::new()), Arc::new(RegionCatalog::new()));
        let result = engine.get_track("X1", None, None);
        assert!(matches!(
            result,
            Err(TrackingError::NotFound(NotFound::Track(_)))
        ));

        let windowed = seeded().get_track("X1", Some(at(10)), None);
        assert_eq!(windowed.unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_crossings_newest_first() {
        let store = Arc::new(MemoryStore::new());
        for (hour, kind) in [(1, CrossingType::Entry), (2, CrossingType::Exit)] {
            let report = RawPositionReport::new("X1", "VESSEL", at(hour), 5.0, 5.0)
                .validate()
                .unwrap();
            let previous = store.latest_before("X1", at(hour)).unwrap().map(|r| r.id);
            store
                .commit(CommitRequest {
                    report,
                    previous,
                    crossings: vec![NewCrossing {
                        asset_id: "X1".into(),
                        region_id: RegionId(1),
                        crossing_type: kind,
                        crossing_time: at(hour),
                        position: GeoPoint::new(5.0, 5.0),
                    }],
                })
                .unwrap();
        }
        let engine = QueryEngine::new(store, Arc::new(RegionCatalog::new()));

        let all = engine.query_crossings(CrossingQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        let blank = engine
            .query_crossings(CrossingQuery {
                asset_id: Some(" ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blank.len(), 2);
        assert_eq!(all[0].crossing_type, CrossingType::Exit);

        let early = engine
            .query_crossings(CrossingQuery {
                end: Some(at(1)),
                region_id: Some(RegionId(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].crossing_type, CrossingType::Entry);

        let json = serde_json::to_value(&all[0]).unwrap();
        assert_eq!(json["position"]["type"], "Point");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2024-01-01T03:00:00Z").unwrap(), at(3));
        assert_eq!(
            parse_timestamp("2024-01-01T05:00:00+02:00").unwrap(),
            at(3)
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ValidationError::Timestamp(_))
        ));
    }
}
