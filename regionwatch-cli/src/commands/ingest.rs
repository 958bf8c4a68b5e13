//! `regionwatch ingest`: newline-delimited JSON reports in, one JSON result
//! per line out.
//!
//! Each non-empty input line must be a raw position report:
//!
//! ```text
//! {"asset_id": "X1", "asset_type": "VESSEL", "timestamp": "2024-01-01T00:00:00Z",
//!  "latitude": 5.0, "longitude": 5.0}
//! ```
//!
//! Lines that fail to decode or validate are reported and skipped; the rest
//! are ingested and the snapshot is saved.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tracing::info;

use regionwatch::error::ValidationError;
use regionwatch::model::RawPositionReport;
use regionwatch::TrackingError;

use super::common::CliContext;
use crate::error::CliError;

/// Arguments for `ingest`.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// NDJSON file of reports (reads stdin when omitted)
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

/// Decode one input line.
pub fn parse_line(line: &str) -> Result<RawPositionReport, TrackingError> {
    serde_json::from_str(line)
        .map_err(|e| ValidationError::Report(e.to_string()).into())
}

pub async fn run(ctx: &CliContext, args: IngestArgs) -> Result<(), CliError> {
    let (origin, reader): (String, Box<dyn BufRead>) = match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(|error| CliError::Input {
                origin: path.display().to_string(),
                error,
            })?;
            (path.display().to_string(), Box::new(BufReader::new(file)))
        }
        None => ("stdin".to_string(), Box::new(BufReader::new(io::stdin()))),
    };

    let mut line_numbers = Vec::new();
    let mut reports = Vec::new();
    let mut failed = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|error| CliError::Input {
            origin: origin.clone(),
            error,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(report) => {
                line_numbers.push(index + 1);
                reports.push(report);
            }
            Err(e) => {
                failed += 1;
                print_failure(index + 1, &e);
            }
        }
    }

    let total = failed + reports.len();
    let results = ctx.pipeline().ingest_all(reports).await;
    for (line, result) in line_numbers.into_iter().zip(results) {
        match result {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome.response())?),
            Err(e) => {
                failed += 1;
                print_failure(line, &e);
            }
        }
    }

    ctx.save()?;
    info!(total, failed, source = %origin, "Ingestion finished");

    if failed > 0 {
        return Err(CliError::PartialIngest { failed, total });
    }
    Ok(())
}

fn print_failure(line: usize, error: &TrackingError) {
    println!(
        "{}",
        json!({ "line": line, "status": error.status_code(), "error": error.to_string() })
    );
}
