//! Ingestion pipeline
//!
//! Turns one raw position report into a stored report plus the crossings it
//! triggered:
//!
//! ```text
//! validate ──► lock(asset) ──► latest_before ──► detect ──► commit ──► respond
//!                  ▲                                          │
//!                  └──────── retry (transient / conflict) ◄───┘
//! ```
//!
//! # Design
//!
//! - **Per-asset serialization**: the whole lookup/detect/commit sequence runs
//!   under the asset's lock ([`AssetLocks`]), so "previous" is always the true
//!   predecessor at insertion time. Different assets proceed concurrently.
//! - **All or nothing**: detection runs before anything is written, and the
//!   report and its crossings go to the store in a single
//!   [`TrackStore::commit`]. A failed commit leaves no partial state.
//! - **Bounded retry**: transient store failures and optimistic-commit
//!   conflicts redo the lookup and detection and try again, following the
//!   configured [`RetryPolicy`]. Validation errors are never retried.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use regionwatch::catalog::RegionCatalog;
//! use regionwatch::ingest::IngestPipeline;
//! use regionwatch::store::MemoryStore;
//!
//! let pipeline = IngestPipeline::new(Arc::new(MemoryStore::new()), Arc::new(catalog));
//! let outcome = pipeline.ingest(raw_report).await?;
//! for notice in &outcome.notices {
//!     println!("{} {}", notice.crossing_type, notice.region_name);
//! }
//! ```

mod locks;
mod retry;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::catalog::RegionCatalog;
use crate::detector::{CrossingDetector, DetectorConfig, Observation, SkippedRegion};
use crate::error::{TrackingError, TrackingResult};
use crate::model::{
    CrossingType, NewPositionReport, PositionReport, RawPositionReport, RegionCrossing, RegionId,
    ReportId,
};
use crate::store::{CommitRequest, StoreError, StoreResult, TrackStore};

pub use locks::{AssetGuard, AssetLocks};
pub use retry::{
    RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_SECS,
};

/// A crossing as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingNotice {
    pub region_id: RegionId,
    pub region_name: String,
    pub crossing_type: CrossingType,
}

/// A region detection could not evaluate for this report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedNotice {
    pub region_id: RegionId,
    pub region_name: String,
    pub reason: String,
}

impl From<&SkippedRegion> for SkippedNotice {
    fn from(skipped: &SkippedRegion) -> Self {
        Self {
            region_id: skipped.region_id,
            region_name: skipped.region_name.clone(),
            reason: skipped.error.to_string(),
        }
    }
}

/// Everything produced by ingesting one report.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The stored report.
    pub report: PositionReport,
    /// The stored crossings, in ascending region-id order.
    pub crossings: Vec<RegionCrossing>,
    /// One notice per crossing, with the region's display name.
    pub notices: Vec<CrossingNotice>,
    /// Regions skipped because their boundary could not be evaluated.
    pub skipped: Vec<SkippedNotice>,
}

impl IngestOutcome {
    /// The caller-facing summary of this outcome.
    pub fn response(&self) -> IngestResponse {
        IngestResponse {
            id: self.report.id,
            asset_id: self.report.asset_id.clone(),
            timestamp: self.report.timestamp,
            crossings: self.notices.clone(),
            crossing_events: self.crossings.clone(),
            skipped_regions: self.skipped.clone(),
        }
    }
}

/// Serialized response for one ingested report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
    pub id: ReportId,
    pub asset_id: String,
    pub timestamp: DateTime<Utc>,
    pub crossings: Vec<CrossingNotice>,
    /// The stored crossing rows behind `crossings`.
    pub crossing_events: Vec<RegionCrossing>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_regions: Vec<SkippedNotice>,
}

/// Orchestrates validation, per-asset locking, detection and commit.
pub struct IngestPipeline<S: TrackStore + ?Sized> {
    store: Arc<S>,
    catalog: Arc<RegionCatalog>,
    detector: CrossingDetector,
    locks: AssetLocks,
    retry: RetryPolicy,
}

impl<S: TrackStore + ?Sized> IngestPipeline<S> {
    /// Create a pipeline with the default detector and retry policy.
    pub fn new(store: Arc<S>, catalog: Arc<RegionCatalog>) -> Self {
        Self {
            store,
            catalog,
            detector: CrossingDetector::default(),
            locks: AssetLocks::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Use a specific detector configuration.
    pub fn with_detector(mut self, config: DetectorConfig) -> Self {
        self.detector = CrossingDetector::new(config);
        self
    }

    /// Use a specific retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<RegionCatalog> {
        &self.catalog
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Ingest one report.
    ///
    /// # Errors
    ///
    /// - [`TrackingError::Validation`] when the report is malformed (nothing
    ///   is written).
    /// - [`TrackingError::Conflict`] when concurrent writers kept invalidating
    ///   the previous report until retries ran out.
    /// - [`TrackingError::Storage`] when the store failed permanently or
    ///   retries ran out.
    pub async fn ingest(&self, raw: RawPositionReport) -> TrackingResult<IngestOutcome> {
        let report = raw.validate()?;
        let span = info_span!("ingest", asset_id = %report.asset_id);
        self.ingest_validated(report).instrument(span).await
    }

    /// Ingest a batch, preserving submission order within each asset.
    ///
    /// Reports for different assets are ingested concurrently. Results are
    /// returned in input order.
    pub async fn ingest_all(
        &self,
        reports: Vec<RawPositionReport>,
    ) -> Vec<TrackingResult<IngestOutcome>> {
        let total = reports.len();
        let mut by_asset: HashMap<String, Vec<(usize, RawPositionReport)>> = HashMap::new();
        for (index, raw) in reports.into_iter().enumerate() {
            by_asset
                .entry(raw.asset_id.trim().to_string())
                .or_default()
                .push((index, raw));
        }

        let streams = by_asset.into_values().map(|queue| async move {
            let mut results = Vec::with_capacity(queue.len());
            for (index, raw) in queue {
                results.push((index, self.ingest(raw).await));
            }
            results
        });

        let mut ordered: Vec<Option<TrackingResult<IngestOutcome>>> =
            std::iter::repeat_with(|| None).take(total).collect();
        for (index, result) in futures::future::join_all(streams).await.into_iter().flatten() {
            ordered[index] = Some(result);
        }

        let results: Vec<_> = ordered.into_iter().flatten().collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total, failed, "Batch ingestion complete");
        results
    }

    async fn ingest_validated(&self, report: NewPositionReport) -> TrackingResult<IngestOutcome> {
        let _guard = self.locks.acquire(&report.asset_id).await;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.try_commit(&report) {
                Ok(outcome) => {
                    debug!(
                        report_id = %outcome.report.id,
                        crossings = outcome.crossings.len(),
                        attempt,
                        "Report ingested"
                    );
                    return Ok(outcome);
                }
                Err(e) => e,
            };

            if !(err.is_transient() || err.is_conflict()) {
                error!(error = %err, "Storage failure, not retrying");
                return Err(err.into());
            }

            match self.retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Commit failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(attempts = attempt, error = %err, "Commit failed, retries exhausted");
                    return Err(match err {
                        StoreError::Conflict { asset_id, .. } => TrackingError::Conflict { asset_id },
                        other => TrackingError::Storage(other),
                    });
                }
            }
        }
    }

    /// One lookup/detect/commit round. Must run under the asset's lock.
    fn try_commit(&self, report: &NewPositionReport) -> StoreResult<IngestOutcome> {
        let previous = self
            .store
            .latest_before(&report.asset_id, report.timestamp)?;

        let regions = self.catalog.snapshot();
        let detection = self.detector.detect(
            previous.as_ref().map(|p| p.location),
            Observation {
                asset_id: &report.asset_id,
                timestamp: report.timestamp,
                location: report.location,
            },
            &regions,
        );

        let notices: Vec<CrossingNotice> = detection
            .crossings
            .iter()
            .map(|d| CrossingNotice {
                region_id: d.crossing.region_id,
                region_name: d.region_name.clone(),
                crossing_type: d.crossing.crossing_type,
            })
            .collect();
        let skipped = detection.skipped.iter().map(SkippedNotice::from).collect();

        let committed = self.store.commit(CommitRequest {
            report: report.clone(),
            previous: previous.map(|p| p.id),
            crossings: detection
                .crossings
                .into_iter()
                .map(|d| d.crossing)
                .collect(),
        })?;

        Ok(IngestOutcome {
            report: committed.report,
            crossings: committed.crossings,
            notices,
            skipped,
        })
    }
}
