//! The full run: select nearby stations, fetch their observations for the
//! window and assemble cleaned series.

use anyhow::Context;
use log::info;
use nbs_core::{
    date_range::DateWindow,
    series::{EntitySeries, SelectionSet},
    station::Station,
};
use nbs_geo::{
    projection::{self, SrsDefinition},
    select_within_radius_with, BoundingBox, GeometryOps,
};
use nbs_series::assemble::build_series_for;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    config::{ConfigError, QueryConfig},
    sink::{write_latest_csv, write_series_csv, write_summary_json, write_table_csv, RunSummary},
    source::{feature_source_for_path, CsvObservationSource, FeatureSource, ObservationSource},
};

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub window: DateWindow,
    /// Stations inside the circle that also have a usable series
    pub selection: SelectionSet,
    pub series: BTreeMap<String, EntitySeries>,
    /// Stations inside the circle with no usable value in the window
    pub excluded: BTreeSet<String>,
    /// Candidate records of every station inside the circle
    pub stations: Vec<Station>,
}

impl PipelineOutput {
    pub fn summary(&self) -> RunSummary {
        RunSummary::new(
            self.window,
            self.selection.clone(),
            self.excluded.clone(),
            &self.series,
        )
    }
}

/// Pipeline errors are surfaced unwrapped so callers can downcast them.
pub(crate) fn config_error(e: ConfigError) -> anyhow::Error {
    match e {
        ConfigError::Invalid(pipeline) => pipeline.into(),
        other => other.into(),
    }
}

/// Bounding box around a geographic center, `None` for a projected one.
pub(crate) fn prefilter_for(config: &QueryConfig) -> anyhow::Result<Option<BoundingBox>> {
    let center_srs = config.selector_options().center_srs;
    let geographic = projection::lookup(&center_srs) == Some(SrsDefinition::Geographic);
    if !geographic {
        return Ok(None);
    }
    let center = config.center().map_err(config_error)?;
    let radius_km = config.radius_km().map_err(config_error)?;
    Ok(Some(BoundingBox::around(&center, radius_km)))
}

/// Select the stations within the configured radius.
pub fn select_stations<G: GeometryOps + ?Sized>(
    ops: &G,
    config: &QueryConfig,
    features: &dyn FeatureSource,
) -> anyhow::Result<Vec<Station>> {
    let center = config.center().map_err(config_error)?;
    let radius_km = config.radius_km().map_err(config_error)?;
    let candidates = features.features()?;
    let selected =
        select_within_radius_with(ops, center, radius_km, &candidates, &config.selector_options())?;
    Ok(candidates
        .into_iter()
        .filter(|s| selected.contains(&s.station_id))
        .collect())
}

/// Run selection then assembly.
///
/// The query is validated before either source is read. Fails with the
/// first stage error; nothing is retried.
pub fn run_pipeline<G: GeometryOps + ?Sized>(
    ops: &G,
    config: &QueryConfig,
    features: &dyn FeatureSource,
    observations: &dyn ObservationSource,
) -> anyhow::Result<PipelineOutput> {
    config.validate().map_err(config_error)?;
    run_validated(ops, config, features, observations)
}

/// [`run_pipeline`] for a query that has already passed `validate`.
fn run_validated<G: GeometryOps + ?Sized>(
    ops: &G,
    config: &QueryConfig,
    features: &dyn FeatureSource,
    observations: &dyn ObservationSource,
) -> anyhow::Result<PipelineOutput> {
    let window = config.window().map_err(config_error)?;

    let stations = select_stations(ops, config, features)?;
    let selected: BTreeSet<String> = stations.iter().map(|s| s.station_id.clone()).collect();

    let records = observations.observations(Some(&selected), &window)?;
    let assembled = build_series_for(&selected, &records)?;
    let selection = SelectionSet::new(&selected, &assembled.series);
    info!(
        "{} of {} selected station(s) have usable data",
        selection.len(),
        selected.len()
    );

    Ok(PipelineOutput {
        window,
        selection,
        series: assembled.series,
        excluded: assembled.excluded,
        stations,
    })
}

/// Write to `path`, or to stdout when there is none.
pub(crate) fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Output locations for the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunOutputs {
    pub series: Option<PathBuf>,
    pub latest: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// `run` command: read both sources from files and write every requested
/// output. The query is validated before either file is opened.
pub fn run_full<G: GeometryOps + ?Sized>(
    ops: &G,
    config: &QueryConfig,
    candidates: &Path,
    observations: &Path,
    bbox_prefilter: bool,
    outputs: &RunOutputs,
) -> anyhow::Result<()> {
    config.validate().map_err(config_error)?;
    let prefilter = if bbox_prefilter {
        prefilter_for(config)?
    } else {
        None
    };
    let features = feature_source_for_path(candidates, config.assume_srs, prefilter)
        .with_context(|| format!("Failed to open candidates {}", candidates.display()))?;
    let observation_source = CsvObservationSource::from_path(observations)
        .with_context(|| format!("Failed to open observations {}", observations.display()))?;

    let output = run_validated(ops, config, features.as_ref(), &observation_source)?;

    write_series_csv(open_output(outputs.series.as_deref())?, &output.series)?;
    if let Some(path) = &outputs.latest {
        write_latest_csv(open_output(Some(path))?, &output.series, &output.stations)?;
    }
    if let Some(path) = &outputs.table {
        write_table_csv(open_output(Some(path))?, &output.series, &output.window)?;
    }
    if let Some(path) = &outputs.summary {
        write_summary_json(open_output(Some(path))?, &output.summary())?;
    }
    info!(
        "Run complete: {} series, {} excluded",
        output.series.len(),
        output.excluded.len()
    );
    Ok(())
}
