//! Command implementations for the nearby-stations CLI.
//!
//! Provides subcommands to select stations near a point, assemble cleaned
//! observation series, or do both in one run.

use chrono::NaiveDate;
use clap::Subcommand;
use nbs_geo::GeometryOps;
use std::path::PathBuf;

pub mod config;
pub mod error;
pub mod pipeline;
pub mod select;
pub mod series;
pub mod sink;
pub mod source;

use config::QueryArgs;
use pipeline::RunOutputs;

#[derive(Subcommand)]
pub enum Command {
    /// List candidate stations within a radius of a point
    Select {
        /// Candidate stations (GeoJSON, or CSV by extension)
        #[arg(short = 'c', long)]
        candidates: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        /// Drop geographic candidates outside the radius' bounding box first
        #[arg(long)]
        bbox_prefilter: bool,

        /// Output CSV path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Assemble cleaned per-station series from an observation CSV
    Series {
        /// Observation CSV (station_id,date,value)
        #[arg(short = 'b', long)]
        observations: PathBuf,

        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the window (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: NaiveDate,

        /// Only these stations (repeatable); all stations when omitted
        #[arg(short = 's', long = "station")]
        stations: Vec<String>,

        /// Output CSV path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Select nearby stations and assemble their series
    Run {
        /// Candidate stations (GeoJSON, or CSV by extension)
        #[arg(short = 'c', long)]
        candidates: PathBuf,

        /// Observation CSV (station_id,date,value)
        #[arg(short = 'b', long)]
        observations: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        /// Drop geographic candidates outside the radius' bounding box first
        #[arg(long)]
        bbox_prefilter: bool,

        /// Long-format series CSV (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Latest value per station with its location
        #[arg(long)]
        latest: Option<PathBuf>,

        /// Wide table: one row per day, one column per station
        #[arg(long)]
        table: Option<PathBuf>,

        /// JSON summary of selection and exclusions
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

/// Geometry backend: libproj with the `proj` feature, built-in projections
/// otherwise.
pub fn geometry() -> Box<dyn GeometryOps> {
    #[cfg(feature = "proj")]
    {
        Box::new(nbs_geo::ops::ProjGeometry)
    }
    #[cfg(not(feature = "proj"))]
    {
        Box::new(nbs_geo::NativeGeometry)
    }
}

pub fn run(command: Command) -> anyhow::Result<()> {
    let ops = geometry();
    match command {
        Command::Select {
            candidates,
            query,
            bbox_prefilter,
            output,
        } => {
            let config = query.resolve().map_err(pipeline::config_error)?;
            select::run_select(
                ops.as_ref(),
                &config,
                &candidates,
                bbox_prefilter,
                output.as_deref(),
            )
        }
        Command::Series {
            observations,
            start,
            end,
            stations,
            output,
        } => series::run_series(&observations, start, end, &stations, output.as_deref()),
        Command::Run {
            candidates,
            observations,
            query,
            bbox_prefilter,
            output,
            latest,
            table,
            summary,
        } => {
            let config = query.resolve().map_err(pipeline::config_error)?;
            let outputs = RunOutputs {
                series: output,
                latest,
                table,
                summary,
            };
            pipeline::run_full(
                ops.as_ref(),
                &config,
                &candidates,
                &observations,
                bbox_prefilter,
                &outputs,
            )
        }
    }
}
