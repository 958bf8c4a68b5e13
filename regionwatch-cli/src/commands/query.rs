//! Read-only commands: `positions`, `track`, `regions` and `crossings`.
//!
//! Each prints a single pretty-printed JSON document on stdout.

use chrono::{DateTime, Utc};
use clap::Args;

use regionwatch::model::{Region, RegionId};
use regionwatch::query::{parse_timestamp, CrossingQuery, PositionQuery};
use regionwatch::TrackingError;

use super::common::{print_json, CliContext};
use crate::error::CliError;

/// Time window shared by several commands (RFC 3339, inclusive).
#[derive(Debug, Default, Args)]
pub struct TimeWindow {
    /// Earliest timestamp to include
    #[arg(long)]
    pub start: Option<String>,

    /// Latest timestamp to include
    #[arg(long)]
    pub end: Option<String>,
}

type Bounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

impl TimeWindow {
    /// Parse both bounds, reporting malformed timestamps as validation errors.
    pub fn parse(&self) -> Result<Bounds, TrackingError> {
        let start = self.start.as_deref().map(parse_timestamp).transpose()?;
        let end = self.end.as_deref().map(parse_timestamp).transpose()?;
        Ok((start, end))
    }
}

/// Arguments for `positions`.
#[derive(Debug, Args)]
pub struct PositionsArgs {
    /// Only this asset
    #[arg(long)]
    pub asset_id: Option<String>,

    /// Only this asset type (VESSEL, AIRCRAFT, VEHICLE, ...)
    #[arg(long)]
    pub asset_type: Option<String>,

    #[command(flatten)]
    pub window: TimeWindow,

    /// Only reports inside this region's current boundary
    #[arg(long)]
    pub region_id: Option<u64>,

    /// Only reports inside minLon,minLat,maxLon,maxLat
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Maximum number of reports (defaults to [query] default_limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for `track`.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Asset whose track to build
    pub asset_id: String,

    #[command(flatten)]
    pub window: TimeWindow,
}

/// Arguments for `crossings`.
#[derive(Debug, Args)]
pub struct CrossingsArgs {
    /// Only this asset
    #[arg(long)]
    pub asset_id: Option<String>,

    /// Only this region
    #[arg(long)]
    pub region_id: Option<u64>,

    #[command(flatten)]
    pub window: TimeWindow,
}

pub fn run_positions(ctx: &CliContext, args: PositionsArgs) -> Result<(), CliError> {
    let (start, end) = args.window.parse()?;
    let page = ctx.queries().query_positions(PositionQuery {
        asset_id: args.asset_id,
        asset_type: args.asset_type,
        start,
        end,
        region_id: args.region_id.map(RegionId),
        bbox: args.bbox,
        limit: args.limit,
    })?;
    print_json(&page)
}

pub fn run_track(ctx: &CliContext, args: TrackArgs) -> Result<(), CliError> {
    let (start, end) = args.window.parse()?;
    let track = ctx.queries().get_track(&args.asset_id, start, end)?;
    print_json(&track)
}

pub fn run_regions(ctx: &CliContext) -> Result<(), CliError> {
    let regions = ctx.queries().list_regions();
    let regions: Vec<&Region> = regions.iter().map(|r| r.as_ref()).collect();
    print_json(&regions)
}

pub fn run_crossings(ctx: &CliContext, args: CrossingsArgs) -> Result<(), CliError> {
    let (start, end) = args.window.parse()?;
    let crossings = ctx.queries().query_crossings(CrossingQuery {
        asset_id: args.asset_id,
        region_id: args.region_id.map(RegionId),
        start,
        end,
    })?;
    print_json(&crossings)
}
