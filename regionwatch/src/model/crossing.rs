//! Region crossing events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RegionId;
use crate::geometry::GeoPoint;

/// Identity assigned to a stored crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossingId(pub u64);

impl fmt::Display for CrossingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a containment transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CrossingType {
    /// Outside before, inside now.
    Entry,
    /// Inside before, outside now.
    Exit,
}

impl CrossingType {
    /// Classify a containment transition, `None` when unchanged.
    pub fn from_transition(was_in: bool, is_in: bool) -> Option<Self> {
        match (was_in, is_in) {
            (false, true) => Some(Self::Entry),
            (true, false) => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "ENTRY",
            Self::Exit => "EXIT",
        }
    }
}

impl fmt::Display for CrossingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A crossing produced by detection, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrossing {
    pub asset_id: String,
    pub region_id: RegionId,
    pub crossing_type: CrossingType,
    /// Timestamp of the triggering report.
    pub crossing_time: DateTime<Utc>,
    /// Location of the triggering report.
    pub position: GeoPoint,
}

impl NewCrossing {
    pub fn into_stored(self, id: CrossingId, recorded_at: DateTime<Utc>) -> RegionCrossing {
        RegionCrossing {
            id,
            asset_id: self.asset_id,
            region_id: self.region_id,
            crossing_type: self.crossing_type,
            crossing_time: self.crossing_time,
            position: self.position,
            recorded_at,
        }
    }
}

/// A stored, immutable crossing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCrossing {
    pub id: CrossingId,
    pub asset_id: String,
    pub region_id: RegionId,
    pub crossing_type: CrossingType,
    pub crossing_time: DateTime<Utc>,
    pub position: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}
