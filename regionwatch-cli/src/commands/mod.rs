//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`ingest`] - NDJSON report ingestion
//! - [`query`] - Positions, tracks, regions and crossing history
//! - [`config`] - Configuration management (init, show)

pub mod common;
pub mod config;
pub mod ingest;
pub mod query;
