//! Settings structs for each configuration section.
//!
//! Each struct is one `[section]` of `config.ini`. Defaults live alongside so
//! a missing file or section behaves exactly like a freshly written one.

use std::path::PathBuf;
use std::time::Duration;

use crate::detector::DetectorConfig;
use crate::ingest::{RetryPolicy, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::query::{QuerySettings, DEFAULT_LIMIT, MAX_LIMIT};

/// Name of the configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".regionwatch";

/// Default snapshot file name.
pub const DEFAULT_DATA_FILE: &str = "tracks.json";

/// Default region catalog file name.
pub const DEFAULT_REGIONS_FILE: &str = "regions.geojson";

/// Default log directory name inside the config directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "regionwatch.log";

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub store: StoreSettings,
    pub regions: RegionSettings,
    pub ingest: IngestSettings,
    pub query: QueryLimits,
    pub logging: LoggingSettings,
}

/// `[store]`
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// JSON snapshot of reports and crossings.
    pub data_file: PathBuf,
}

/// `[regions]`
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSettings {
    /// GeoJSON FeatureCollection of regions.
    pub file: PathBuf,
}

/// `[ingest]`
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    /// Total commit attempts per report (at least 1).
    pub retry_attempts: u32,
    /// Backoff before the first retry; doubles per retry.
    pub retry_delay_ms: u64,
    /// Skip regions whose bounding box holds neither position.
    pub bbox_prefilter: bool,
}

impl IngestSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential_from(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            bbox_prefilter: self.bbox_prefilter,
        }
    }
}

/// `[query]`
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl QueryLimits {
    pub fn settings(&self) -> QuerySettings {
        QuerySettings {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let base = super::file::config_directory();
        Self {
            store: StoreSettings {
                data_file: base.join(DEFAULT_DATA_FILE),
            },
            regions: RegionSettings {
                file: base.join(DEFAULT_REGIONS_FILE),
            },
            ingest: IngestSettings {
                retry_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_delay_ms: DEFAULT_INITIAL_DELAY_MS,
                bbox_prefilter: false,
            },
            query: QueryLimits {
                default_limit: DEFAULT_LIMIT,
                max_limit: MAX_LIMIT,
            },
            logging: LoggingSettings {
                directory: base.join(DEFAULT_LOG_DIR),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
