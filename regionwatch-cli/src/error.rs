//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use regionwatch::catalog::CatalogError;
use regionwatch::config::ConfigFileError;
use regionwatch::store::StoreError;
use regionwatch::TrackingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Region catalog could not be loaded
    Catalog(CatalogError),
    /// Track snapshot could not be loaded or saved
    Snapshot { path: PathBuf, error: StoreError },
    /// Failed to read input
    Input { origin: String, error: std::io::Error },
    /// Failed to encode output
    Output(serde_json::Error),
    /// A query or ingestion failed
    Tracking(TrackingError),
    /// Some reports in a batch were rejected
    PartialIngest { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Catalog(CatalogError::Io { .. }) => {
                eprintln!();
                eprintln!("Set the region file in config.ini:");
                eprintln!("  [regions]");
                eprintln!("  file = ~/.regionwatch/regions.geojson");
            }
            CliError::PartialIngest { .. } => {
                eprintln!("Accepted reports were stored; see the per-line errors above.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Catalog(e) => write!(f, "Failed to load regions: {}", e),
            CliError::Snapshot { path, error } => {
                write!(f, "Track snapshot '{}': {}", path.display(), error)
            }
            CliError::Input { origin, error } => {
                write!(f, "Failed to read input from {}: {}", origin, error)
            }
            CliError::Output(e) => write!(f, "Failed to encode output: {}", e),
            CliError::Tracking(e) => write!(f, "{} (status {})", e, e.status_code()),
            CliError::PartialIngest { failed, total } => {
                write!(f, "{} of {} reports were rejected", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Catalog(e) => Some(e),
            CliError::Snapshot { error, .. } => Some(error),
            CliError::Input { error, .. } => Some(error),
            CliError::Output(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::PartialIngest { .. } => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionwatch::error::NotFound;

    #[test]
    fn test_tracking_error_shows_status() {
        let err = CliError::from(TrackingError::from(NotFound::Track("X1".into())));
        assert_eq!(
            err.to_string(),
            "no positions found for asset 'X1' (status 404)"
        );
    }

    #[test]
    fn test_partial_ingest_message() {
        let err = CliError::PartialIngest { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 of 5 reports were rejected");
    }
}
