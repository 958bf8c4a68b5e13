//! Domain entities: position reports, regions and region crossings.
//!
//! All entities are immutable once stored. Identities are assigned by the
//! track store (reports, crossings) or by whoever populates the region
//! catalog (regions).

mod crossing;
mod region;
mod report;

pub use crossing::{CrossingId, CrossingType, NewCrossing, RegionCrossing};
pub use region::{Region, RegionId};
pub use report::{
    AssetType, NewPositionReport, PositionReport, RawPositionReport, ReportId, MAX_ASSET_ID_LEN,
    MAX_ASSET_TYPE_LEN,
};

/// Arbitrary structured attributes attached to reports and regions.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
