//! Asset track store
//!
//! The storage collaborator behind ingestion and queries. The [`TrackStore`]
//! trait is the boundary: point/polygon storage, insert-with-generated-id,
//! containment and bounding-box predicates, and timestamp ordering.
//!
//! # Atomicity
//!
//! [`TrackStore::commit`] writes one report and all of its crossings as a
//! single unit. Readers never observe the report without its crossings.
//!
//! # Optimistic check
//!
//! A [`CommitRequest`] names the previous report its crossings were computed
//! against. If the store's latest-before answer has changed by the time the
//! commit is applied, the commit is rejected with [`StoreError::Conflict`]
//! and nothing is written.

mod filter;
mod lock;
mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{NewCrossing, NewPositionReport, PositionReport, RegionCrossing, ReportId};

pub use filter::{CrossingFilter, ReportFilter, SortOrder, TimeRange};
pub use lock::{LockMode, SnapshotLock};
pub use memory::MemoryStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a track store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is temporarily unreachable (connection loss, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The previous report changed between lookup and commit.
    #[error(
        "previous report for asset '{asset_id}' changed (expected {expected:?}, found {actual:?})"
    )]
    Conflict {
        asset_id: String,
        expected: Option<ReportId>,
        actual: Option<ReportId>,
    },

    /// Snapshot file I/O failed.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot contents could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    /// Whether the pipeline should redo lookup and detection before retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// One report plus the crossings it triggered, to be written atomically.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub report: NewPositionReport,
    /// The report detection compared against (`None` on cold start).
    pub previous: Option<ReportId>,
    pub crossings: Vec<NewCrossing>,
}

/// The stored form of a [`CommitRequest`].
#[derive(Debug, Clone)]
pub struct CommittedReport {
    pub report: PositionReport,
    pub crossings: Vec<RegionCrossing>,
}

/// Storage collaborator for position reports and crossings.
pub trait TrackStore: Send + Sync {
    /// The report for `asset_id` with the greatest timestamp strictly before
    /// `before`. Among equal timestamps the smallest id wins.
    fn latest_before(
        &self,
        asset_id: &str,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<PositionReport>>;

    /// Store a single report with no crossings.
    fn append(&self, report: NewPositionReport) -> StoreResult<PositionReport>;

    /// Store a report and its crossings as one unit.
    fn commit(&self, request: CommitRequest) -> StoreResult<CommittedReport>;

    /// Reports matching every criterion in `filter`.
    fn find_reports(&self, filter: &ReportFilter) -> StoreResult<Vec<PositionReport>>;

    /// Crossings matching every criterion in `filter`, newest first.
    fn find_crossings(&self, filter: &CrossingFilter) -> StoreResult<Vec<RegionCrossing>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(StoreError::Unavailable("reset".into()).is_transient());

        let conflict = StoreError::Conflict {
            asset_id: "X1".into(),
            expected: None,
            actual: Some(ReportId(4)),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_transient());

        let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_transient());
        assert!(!io.is_conflict());
    }
}
