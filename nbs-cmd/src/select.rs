//! `select` command: list the candidate stations inside the radius.

use anyhow::Context;
use log::info;
use nbs_geo::GeometryOps;
use std::path::Path;

use crate::{
    config::QueryConfig,
    pipeline::{config_error, open_output, prefilter_for, select_stations},
    sink::write_stations_csv,
    source::feature_source_for_path,
};

pub fn run_select<G: GeometryOps + ?Sized>(
    ops: &G,
    config: &QueryConfig,
    candidates: &Path,
    bbox_prefilter: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    config.validate_selection().map_err(config_error)?;
    let prefilter = if bbox_prefilter {
        prefilter_for(config)?
    } else {
        None
    };
    let features = feature_source_for_path(candidates, config.assume_srs, prefilter)
        .with_context(|| format!("Failed to open candidates {}", candidates.display()))?;

    let stations = select_stations(ops, config, features.as_ref())?;
    write_stations_csv(open_output(output)?, &stations)?;
    info!("Selected {} station(s)", stations.len());
    Ok(())
}
