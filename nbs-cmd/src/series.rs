//! `series` command: assemble cleaned series straight from an observation
//! file, without a proximity query.

use anyhow::Context;
use chrono::NaiveDate;
use nbs_core::date_range::DateWindow;
use nbs_series::assemble::{build_series, build_series_for};
use std::{collections::BTreeSet, path::Path};

use crate::{
    pipeline::open_output,
    sink::write_series_csv,
    source::{CsvObservationSource, ObservationSource},
};

/// With no `stations` every station in the file is assembled.
pub fn run_series(
    observations: &Path,
    start: NaiveDate,
    end: NaiveDate,
    stations: &[String],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let window = DateWindow::new(start, end)?;
    let source = CsvObservationSource::from_path(observations)
        .with_context(|| format!("Failed to open observations {}", observations.display()))?;

    let assembled = if stations.is_empty() {
        build_series(&source.observations(None, &window)?)?
    } else {
        let requested: BTreeSet<String> = stations.iter().cloned().collect();
        build_series_for(&requested, &source.observations(Some(&requested), &window)?)?
    };
    write_series_csv(open_output(output)?, &assembled.series)?;
    Ok(())
}
