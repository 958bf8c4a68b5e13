//! Position reports as received, validated and stored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Attributes;
use crate::error::ValidationError;
use crate::geometry::GeoPoint;

/// Maximum length of an asset identifier.
pub const MAX_ASSET_ID_LEN: usize = 50;

/// Maximum length of an asset type tag.
pub const MAX_ASSET_TYPE_LEN: usize = 20;

/// Identity assigned to a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of asset reporting positions.
///
/// An open tag: the well-known values are `VESSEL`, `AIRCRAFT` and
/// `VEHICLE`, but any non-empty tag is accepted. Tags are upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetType(String);

impl AssetType {
    pub const VESSEL: &'static str = "VESSEL";
    pub const AIRCRAFT: &'static str = "AIRCRAFT";
    pub const VEHICLE: &'static str = "VEHICLE";

    /// Normalise a tag to its stored form.
    pub fn new(tag: &str) -> Self {
        Self(tag.trim().to_uppercase())
    }

    /// The tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for one of the well-known tags.
    pub fn is_well_known(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::VESSEL | Self::AIRCRAFT | Self::VEHICLE
        )
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A report as submitted by a caller, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPositionReport {
    pub asset_id: String,
    pub asset_type: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed_knots: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub metadata: Option<Attributes>,
}

impl RawPositionReport {
    /// Convenience constructor for a bare position.
    pub fn new(
        asset_id: impl Into<String>,
        asset_type: impl Into<String>,
        timestamp: DateTime<Utc>,
        longitude: f64,
        latitude: f64,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            asset_type: asset_type.into(),
            timestamp,
            latitude,
            longitude,
            speed_knots: None,
            heading: None,
            metadata: None,
        }
    }

    /// Validate and convert into a report ready to store.
    pub fn validate(self) -> Result<NewPositionReport, ValidationError> {
        let asset_id = self.asset_id.trim().to_string();
        check_text("asset_id", &asset_id, MAX_ASSET_ID_LEN)?;
        let asset_type = AssetType::new(&self.asset_type);
        check_text("asset_type", asset_type.as_str(), MAX_ASSET_TYPE_LEN)?;

        let location = GeoPoint::checked(self.longitude, self.latitude)
            .map_err(ValidationError::Coordinates)?;

        if let Some(speed) = self.speed_knots {
            if !speed.is_finite() || speed < 0.0 {
                return Err(ValidationError::Speed(speed));
            }
        }
        if let Some(heading) = self.heading {
            if !heading.is_finite() || !(0.0..=360.0).contains(&heading) {
                return Err(ValidationError::Heading(heading));
            }
        }

        Ok(NewPositionReport {
            asset_id,
            asset_type,
            timestamp: self.timestamp,
            location,
            speed_knots: self.speed_knots,
            heading: self.heading,
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}

/// A validated report that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPositionReport {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub speed_knots: Option<f64>,
    pub heading: Option<f64>,
    pub metadata: Attributes,
}

impl NewPositionReport {
    /// Attach the identity and receipt time assigned by the store.
    pub fn into_stored(self, id: ReportId, recorded_at: DateTime<Utc>) -> PositionReport {
        PositionReport {
            id,
            asset_id: self.asset_id,
            asset_type: self.asset_type,
            timestamp: self.timestamp,
            location: self.location,
            speed_knots: self.speed_knots,
            heading: self.heading,
            metadata: self.metadata,
            recorded_at,
        }
    }
}

/// A stored, immutable position report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub id: ReportId,
    pub asset_id: String,
    pub asset_type: AssetType,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub speed_knots: Option<f64>,
    pub heading: Option<f64>,
    #[serde(default)]
    pub metadata: Attributes,
    /// When the store accepted the report.
    pub recorded_at: DateTime<Utc>,
}
