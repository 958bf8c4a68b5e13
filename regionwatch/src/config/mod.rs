//! Configuration for regionwatch.
//!
//! User configuration lives in `~/.regionwatch/config.ini`. A missing file or
//! section falls back to defaults; a present but invalid value is an error.
//!
//! # Example
//!
//! ```ignore
//! use regionwatch::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let pipeline = IngestPipeline::new(store, catalog)
//!     .with_retry_policy(config.ingest.retry_policy())
//!     .with_detector(config.ingest.detector_config());
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, IngestSettings, LoggingSettings, QueryLimits, RegionSettings, StoreSettings,
    CONFIG_DIR_NAME, DEFAULT_DATA_FILE, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_REGIONS_FILE,
};
