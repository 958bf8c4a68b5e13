//! Crate-level error taxonomy.
//!
//! Every fallible public operation in the ingestion pipeline and query engine
//! returns a [`TrackingError`]. Each variant maps to the status code the
//! request/response boundary reports for it.

use thiserror::Error;

use crate::geometry::GeometryError;
use crate::model::RegionId;
use crate::store::StoreError;

/// Result type for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Caller-supplied input that was rejected before any state change.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeded its maximum length.
    #[error("{field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    /// Coordinates could not be accepted.
    #[error("invalid coordinates: {0}")]
    Coordinates(GeometryError),

    /// Speed was negative or not finite.
    #[error("invalid speed {0} (must be a finite value >= 0)")]
    Speed(f64),

    /// Heading was outside 0..=360 or not finite.
    #[error("invalid heading {0} (must be between 0 and 360)")]
    Heading(f64),

    /// Bounding-box filter could not be parsed.
    #[error("invalid bbox: {0}")]
    BoundingBox(GeometryError),

    /// Start of a time range was after its end.
    #[error("start time {start} is after end time {end}")]
    TimeRange { start: String, end: String },

    /// A timestamp literal could not be parsed.
    #[error("invalid timestamp '{0}' (expected RFC 3339)")]
    Timestamp(String),

    /// Result limit outside the accepted range.
    #[error("limit {limit} must be between 1 and {max}")]
    Limit { limit: usize, max: usize },

    /// A raw report could not be decoded.
    #[error("malformed report: {0}")]
    Report(String),
}

/// A referenced entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    /// No region with this id in the catalog.
    #[error("region {0} not found")]
    Region(RegionId),

    /// No reports matched a track query.
    #[error("no positions found for asset '{0}'")]
    Track(String),
}

/// Errors surfaced by the ingestion pipeline and query engine.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Input rejected; nothing was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A geometry could not be evaluated.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// A referenced entity is missing.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// Concurrent writers disagreed about an asset's previous report.
    #[error("conflicting concurrent ingestion for asset '{asset_id}'")]
    Conflict { asset_id: String },

    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl TrackingError {
    /// Status code reported at the request/response boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            TrackingError::Validation(_) => 400,
            TrackingError::NotFound(_) => 404,
            TrackingError::Conflict { .. } => 409,
            TrackingError::InvalidGeometry(_) => 422,
            TrackingError::Storage(_) => 503,
        }
    }

    /// True for caller errors (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
