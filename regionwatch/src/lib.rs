//! RegionWatch - region entry/exit detection for moving assets
//!
//! Tracks vessels, aircraft and vehicles from a stream of position reports
//! and records an ENTRY or EXIT event whenever an asset's containment in a
//! named geographic region changes.
//!
//! # Architecture
//!
//! ```text
//! RawPositionReport
//!        │
//!        ▼
//!  IngestPipeline ──(per-asset lock)──► TrackStore::latest_before
//!        │                                     │
//!        ▼                                     ▼
//!  CrossingDetector ◄──── RegionCatalog   previous report
//!        │
//!        ▼
//!  TrackStore::commit (report + crossings, atomically)
//!
//!  QueryEngine ──► TrackStore / RegionCatalog (read-only)
//! ```
//!
//! - [`geometry`]: points, polygons, planar containment, GeoJSON and WKT
//! - [`catalog`]: the current set of regions
//! - [`store`]: append-only report and crossing history
//! - [`detector`]: the entry/exit comparison
//! - [`ingest`]: per-asset serialized ingestion with bounded retry
//! - [`query`]: filtered reads
//! - [`config`], [`logging`]: ambient setup

pub mod catalog;
pub mod config;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod query;
pub mod store;

pub use error::{TrackingError, TrackingResult};
