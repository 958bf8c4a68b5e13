//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use regionwatch::catalog::RegionCatalog;
use regionwatch::config::ConfigFile;
use regionwatch::ingest::IngestPipeline;
use regionwatch::logging::{init_logging, LoggingGuard};
use regionwatch::query::QueryEngine;
use regionwatch::store::{LockMode, MemoryStore, SnapshotLock, StoreError};

use crate::error::CliError;

/// Everything a data command needs: configuration, logging, regions and history.
///
/// The track snapshot stays locked for the life of the context, so a writing
/// command's load, ingest and save cannot interleave with another process.
pub struct CliContext {
    pub config: ConfigFile,
    pub catalog: Arc<RegionCatalog>,
    pub store: Arc<MemoryStore>,
    snapshot_lock: SnapshotLock,
    _logging: LoggingGuard,
}

impl CliContext {
    /// Load configuration from `config_path`, start logging, then load the
    /// region catalog and track snapshot it names.
    ///
    /// `mode` is [`LockMode::Exclusive`] for commands that call [`Self::save`].
    pub fn load(config_path: &Path, mode: LockMode) -> Result<Self, CliError> {
        let config = ConfigFile::load_from(config_path)?;
        let logging = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(CliError::LoggingInit)?;

        let catalog = if config.regions.file.exists() {
            RegionCatalog::load_geojson(&config.regions.file)?
        } else {
            warn!(path = %config.regions.file.display(), "Region file not found, no regions loaded");
            RegionCatalog::new()
        };

        let data_file = &config.store.data_file;
        let snapshot_lock = lock_snapshot(data_file, mode)?;
        let store = MemoryStore::load(data_file).map_err(|error| CliError::Snapshot {
            path: data_file.clone(),
            error,
        })?;
        info!(
            regions = catalog.len(),
            reports = store.report_count(),
            "Loaded tracking state"
        );

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            store: Arc::new(store),
            snapshot_lock,
            _logging: logging,
        })
    }

    /// An ingestion pipeline configured from `[ingest]`.
    pub fn pipeline(&self) -> IngestPipeline<MemoryStore> {
        IngestPipeline::new(Arc::clone(&self.store), Arc::clone(&self.catalog))
            .with_retry_policy(self.config.ingest.retry_policy())
            .with_detector(self.config.ingest.detector_config())
    }

    /// A query engine configured from `[query]`.
    pub fn queries(&self) -> QueryEngine<MemoryStore> {
        QueryEngine::new(Arc::clone(&self.store), Arc::clone(&self.catalog))
            .with_settings(self.config.query.settings())
    }

    /// Persist the track store to the configured snapshot file.
    pub fn save(&self) -> Result<(), CliError> {
        let data_file = &self.config.store.data_file;
        if self.snapshot_lock.mode() != LockMode::Exclusive {
            return Err(CliError::Snapshot {
                path: data_file.clone(),
                error: StoreError::Unavailable("snapshot was opened read-only".into()),
            });
        }
        self.store
            .save(data_file)
            .map_err(|error| CliError::Snapshot {
                path: data_file.clone(),
                error,
            })
    }
}

fn lock_snapshot(data_file: &Path, mode: LockMode) -> Result<SnapshotLock, CliError> {
    SnapshotLock::acquire(data_file, mode).map_err(|error| CliError::Snapshot {
        path: data_file.to_path_buf(),
        error,
    })
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
