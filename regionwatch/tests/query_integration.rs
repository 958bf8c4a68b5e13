//! Integration tests for the query engine.
//!
//! These tests verify:
//! - Filtered position queries over ingested history
//! - Track and crossing-history queries, including their JSON shapes
//! - Reads running alongside ingestion never seeing a crossing without its report
//!
//! Run with: `cargo test --test query_integration`

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use regionwatch::catalog::RegionCatalog;
use regionwatch::geometry::Polygon;
use regionwatch::ingest::IngestPipeline;
use regionwatch::model::{CrossingType, RawPositionReport, Region, RegionId};
use regionwatch::query::{CrossingQuery, PositionQuery, QueryEngine};
use regionwatch::store::{MemoryStore, ReportFilter, TrackStore};
use regionwatch::TrackingError;

// ============================================================================
// Test Helpers
// ============================================================================

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, minute, 0).unwrap()
}

fn catalog() -> Arc<RegionCatalog> {
    Arc::new(RegionCatalog::from_regions([
        Region::new(
            RegionId(1),
            "Harbour",
            "PORT",
            Polygon::from_coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]),
        ),
        Region::new(
            RegionId(2),
            "Anchorage",
            "ANCHORAGE",
            Polygon::from_coords(&[(30.0, 30.0), (30.0, 40.0), (40.0, 40.0), (40.0, 30.0)]),
        ),
    ]))
}

/// Ingest a short voyage for two vessels and an aircraft.
async fn seeded() -> (IngestPipeline<MemoryStore>, QueryEngine<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let catalog = catalog();
    let pipeline = IngestPipeline::new(Arc::clone(&store), Arc::clone(&catalog));

    let voyage = [
        ("V1", "VESSEL", 0, 5.0, 5.0),
        ("V1", "VESSEL", 10, 20.0, 20.0),
        ("V1", "VESSEL", 20, 35.0, 35.0),
        ("V2", "VESSEL", 5, 20.0, 20.0),
        ("V2", "VESSEL", 15, 5.0, 5.0),
        ("A1", "AIRCRAFT", 12, 36.0, 36.0),
    ];
    for (asset, kind, minute, lon, lat) in voyage {
        pipeline
            .ingest(RawPositionReport::new(asset, kind, at(minute), lon, lat))
            .await
            .unwrap();
    }

    (pipeline, QueryEngine::new(store, catalog))
}

// ============================================================================
// Positions
// ============================================================================

#[tokio::test]
async fn test_bbox_returns_only_reports_inside() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = IngestPipeline::new(Arc::clone(&store), catalog());
    pipeline
        .ingest(RawPositionReport::new("P", "VEHICLE", at(1), 5.0, 5.0))
        .await
        .unwrap();
    pipeline
        .ingest(RawPositionReport::new("Q", "VEHICLE", at(2), 20.0, 20.0))
        .await
        .unwrap();
    let engine = QueryEngine::new(store, catalog());

    let page = engine
        .query_positions(PositionQuery {
            bbox: Some("0,0,10,10".into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.positions[0].asset_id, "P");
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let (_pipeline, engine) = seeded().await;

    let page = engine
        .query_positions(PositionQuery {
            asset_type: Some("VESSEL".into()),
            region_id: Some(RegionId(1)),
            start: Some(at(1)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.positions[0].asset_id, "V2");
    assert_eq!(page.positions[0].timestamp, at(15));

    let anchorage = engine
        .query_positions(PositionQuery {
            region_id: Some(RegionId(2)),
            ..Default::default()
        })
        .unwrap();
    let assets: Vec<&str> = anchorage
        .positions
        .iter()
        .map(|p| p.asset_id.as_str())
        .collect();
    assert_eq!(assets, vec!["V1", "A1"], "newest first");
}

#[tokio::test]
async fn test_positions_response_shape() {
    let (_pipeline, engine) = seeded().await;
    let page = engine
        .query_positions(PositionQuery {
            asset_id: Some("A1".into()),
            ..Default::default()
        })
        .unwrap();

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["count"], 1);
    let row = &json["positions"][0];
    assert_eq!(row["asset_type"], "AIRCRAFT");
    assert_eq!(row["latitude"], 36.0);
    assert_eq!(row["longitude"], 36.0);
    assert!(row["speed_knots"].is_null());
}

// ============================================================================
// Tracks and crossings
// ============================================================================

#[tokio::test]
async fn test_track_is_oldest_first_line() {
    let (_pipeline, engine) = seeded().await;
    let track = engine.get_track("V1", None, None).unwrap();

    let json = serde_json::to_value(&track).unwrap();
    assert_eq!(json["asset_id"], "V1");
    assert_eq!(json["point_count"], 3);
    assert_eq!(json["track"]["type"], "LineString");
    assert_eq!(
        json["track"]["coordinates"],
        serde_json::json!([[5.0, 5.0], [20.0, 20.0], [35.0, 35.0]])
    );

    let window = engine.get_track("V1", Some(at(10)), Some(at(10))).unwrap();
    assert_eq!(window.point_count, 1);
}

#[tokio::test]
async fn test_track_without_reports_is_not_found() {
    let engine = QueryEngine::new(Arc::new(MemoryStore::new()), catalog());
    let err = engine.get_track("X1", None, None).unwrap_err();
    assert!(matches!(err, TrackingError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_crossing_history() {
    let (_pipeline, engine) = seeded().await;

    let v1 = engine
        .query_crossings(CrossingQuery {
            asset_id: Some("V1".into()),
            ..Default::default()
        })
        .unwrap();
    let summary: Vec<(RegionId, CrossingType)> =
        v1.iter().map(|c| (c.region_id, c.crossing_type)).collect();
    assert_eq!(
        summary,
        vec![
            (RegionId(2), CrossingType::Entry),
            (RegionId(1), CrossingType::Exit),
        ]
    );

    let harbour = engine
        .query_crossings(CrossingQuery {
            region_id: Some(RegionId(1)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(harbour.len(), 2);
    assert_eq!(harbour[0].asset_id, "V2");
    assert_eq!(harbour[0].crossing_type, CrossingType::Entry);

    let json = serde_json::to_value(&harbour[0]).unwrap();
    assert_eq!(json["crossing_type"], "ENTRY");
    assert_eq!(json["position"]["coordinates"], serde_json::json!([5.0, 5.0]));
}

#[tokio::test]
async fn test_regions_listed_in_id_order() {
    let (_pipeline, engine) = seeded().await;
    let regions = engine.list_regions();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].name, "Harbour");

    let json = serde_json::to_value(regions[1].as_ref()).unwrap();
    assert_eq!(json["region_type"], "ANCHORAGE");
    assert_eq!(json["boundary"]["type"], "Polygon");
    assert_eq!(json["boundary"]["coordinates"][0].as_array().unwrap().len(), 5);
}

// ============================================================================
// Reads during ingestion
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_never_see_crossing_without_report() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Arc::new(IngestPipeline::new(Arc::clone(&store), catalog()));
    let engine = Arc::new(QueryEngine::new(Arc::clone(&store), catalog()));

    let writer = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            for minute in 0..50u32 {
                let lon = if minute % 2 == 0 { 5.0 } else { 15.0 };
                pipeline
                    .ingest(RawPositionReport::new("S", "VESSEL", at(minute), lon, 5.0))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let engine = Arc::clone(&engine);
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..200 {
                let crossings = engine.query_crossings(CrossingQuery::default()).unwrap();
                let reports = store.find_reports(&ReportFilter::new().asset_id("S")).unwrap();
                for crossing in &crossings {
                    assert!(
                        reports.iter().any(|r| r.timestamp == crossing.crossing_time),
                        "crossing at {} visible without its report",
                        crossing.crossing_time
                    );
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(store.crossing_count(), 49);
}
