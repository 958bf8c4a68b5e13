//! In-memory track store with JSON snapshot persistence.
//!
//! All state lives behind one `RwLock`, so a commit (report + crossings) is
//! applied under a single write guard and queries read under a read guard:
//! readers never see a half-written commit.
//!
//! Snapshots are written to a uniquely named sibling temp file and renamed
//! into place. A session that loads, changes and saves a snapshot shared with
//! other processes must hold a [`SnapshotLock`](super::SnapshotLock) on it
//! for the whole session.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::filter::{CrossingFilter, ReportFilter, SortOrder};
use super::{CommitRequest, CommittedReport, StoreError, StoreResult, TrackStore};
use crate::model::{
    CrossingId, NewPositionReport, PositionReport, RegionCrossing, ReportId,
};

/// Per-asset index key: reports ordered by timestamp, then id.
type TrackKey = (DateTime<Utc>, ReportId);

#[derive(Default)]
struct StoreState {
    next_report_id: u64,
    next_crossing_id: u64,
    reports: BTreeMap<ReportId, PositionReport>,
    tracks: HashMap<String, BTreeSet<TrackKey>>,
    crossings: BTreeMap<CrossingId, RegionCrossing>,
}

impl StoreState {
    fn latest_before(&self, asset_id: &str, before: DateTime<Utc>) -> Option<&PositionReport> {
        let track = self.tracks.get(asset_id)?;
        // Smallest id with the greatest timestamp strictly before `before`
        let (latest_ts, _) = *track.range(..(before, ReportId(0))).next_back()?;
        let (_, id) = *track.range((latest_ts, ReportId(0))..).next()?;
        self.reports.get(&id)
    }

    fn insert_report(&mut self, report: NewPositionReport, now: DateTime<Utc>) -> PositionReport {
        self.next_report_id += 1;
        let id = ReportId(self.next_report_id);
        let stored = report.into_stored(id, now);
        self.tracks
            .entry(stored.asset_id.clone())
            .or_default()
            .insert((stored.timestamp, id));
        self.reports.insert(id, stored.clone());
        stored
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = StoreState::default();
        for report in snapshot.reports {
            state.next_report_id = state.next_report_id.max(report.id.0);
            state
                .tracks
                .entry(report.asset_id.clone())
                .or_default()
                .insert((report.timestamp, report.id));
            state.reports.insert(report.id, report);
        }
        for crossing in snapshot.crossings {
            state.next_crossing_id = state.next_crossing_id.max(crossing.id.0);
            state.crossings.insert(crossing.id, crossing);
        }
        state
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    reports: Vec<PositionReport>,
    crossings: Vec<RegionCrossing>,
}

/// Track store keeping all reports and crossings in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a snapshot file; a missing file yields an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        let state = StoreState::from_snapshot(snapshot);
        info!(
            path = %path.display(),
            reports = state.reports.len(),
            crossings = state.crossings.len(),
            "Loaded track snapshot"
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write the current contents to `path` (unique temp file, then rename).
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let text = {
            let state = self.state.read();
            let snapshot = Snapshot {
                reports: state.reports.values().cloned().collect(),
                crossings: state.crossings.values().cloned().collect(),
            };
            serde_json::to_string_pretty(&snapshot)?
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "Saved track snapshot");
        Ok(())
    }

    /// Number of stored reports.
    pub fn report_count(&self) -> usize {
        self.state.read().reports.len()
    }

    /// Number of stored crossings.
    pub fn crossing_count(&self) -> usize {
        self.state.read().crossings.len()
    }
}

impl TrackStore for MemoryStore {
    fn latest_before(
        &self,
        asset_id: &str,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<PositionReport>> {
        Ok(self.state.read().latest_before(asset_id, before).cloned())
    }

    fn append(&self, report: NewPositionReport) -> StoreResult<PositionReport> {
        let mut state = self.state.write();
        Ok(state.insert_report(report, Utc::now()))
    }

    fn commit(&self, request: CommitRequest) -> StoreResult<CommittedReport> {
        let mut state = self.state.write();

        let actual = state
            .latest_before(&request.report.asset_id, request.report.timestamp)
            .map(|r| r.id);
        if actual != request.previous {
            return Err(StoreError::Conflict {
                asset_id: request.report.asset_id,
                expected: request.previous,
                actual,
            });
        }

        let now = Utc::now();
        let report = state.insert_report(request.report, now);
        let mut crossings = Vec::with_capacity(request.crossings.len());
        for crossing in request.crossings {
            state.next_crossing_id += 1;
            let id = CrossingId(state.next_crossing_id);
            let stored = crossing.into_stored(id, now);
            state.crossings.insert(id, stored.clone());
            crossings.push(stored);
        }

        Ok(CommittedReport { report, crossings })
    }

    fn find_reports(&self, filter: &ReportFilter) -> StoreResult<Vec<PositionReport>> {
        let state = self.state.read();

        // Narrow to one asset's index when possible
        let mut keys: Vec<TrackKey> = match filter.asset() {
            Some(asset_id) => state
                .tracks
                .get(asset_id)
                .map(|track| track.iter().copied().collect())
                .unwrap_or_default(),
            None => state
                .reports
                .values()
                .map(|r| (r.timestamp, r.id))
                .collect(),
        };
        keys.sort_unstable();
        if filter.sort_order() == SortOrder::NewestFirst {
            keys.reverse();
        }

        let limit = filter.max_results().unwrap_or(usize::MAX);
        Ok(keys
            .into_iter()
            .filter_map(|(_, id)| state.reports.get(&id))
            .filter(|report| filter.matches(report))
            .take(limit)
            .cloned()
            .collect())
    }

    fn find_crossings(&self, filter: &CrossingFilter) -> StoreResult<Vec<RegionCrossing>> {
        let state = self.state.read();
        let mut crossings: Vec<RegionCrossing> = state
            .crossings
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        crossings.sort_by(|a, b| {
            b.crossing_time
                .cmp(&a.crossing_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(crossings)
    }
}
