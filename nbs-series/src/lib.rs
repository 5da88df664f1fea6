//! Assembly of cleaned per-station observation series.
//!
//! Raw records are grouped by station, trailing gaps are trimmed and
//! stations with nothing left are excluded. Leading and interior gaps are
//! kept as they are; nothing is interpolated.

/// Grouping, trimming and exclusion
pub mod assemble {
    use log::{debug, info, warn};
    use nbs_core::{
        error::PipelineError,
        observation::ObservationRecord,
        series::{EntitySeries, SeriesPoint},
    };
    use std::collections::{BTreeMap, BTreeSet};

    /// Output of one assembly pass.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Assembled {
        /// Surviving stations and their cleaned series
        pub series: BTreeMap<String, EntitySeries>,
        /// Stations with no usable value in the window
        pub excluded: BTreeSet<String>,
    }

    /// Partition records by station, keeping arrival order within each one.
    pub fn group_by_station(records: &[ObservationRecord]) -> BTreeMap<String, Vec<SeriesPoint>> {
        let mut grouped: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.station_id.clone())
                .or_default()
                .push(SeriesPoint {
                    date: record.date,
                    value: record.value.filter(|v| !v.is_nan()),
                });
        }
        grouped
    }

    /// Drop points off the end while their value is missing.
    pub fn trim_trailing_missing(points: &mut Vec<SeriesPoint>) {
        while matches!(points.last(), Some(SeriesPoint { value: None, .. })) {
            points.pop();
        }
    }

    /// Build one series per station present in `records`.
    ///
    /// Fails with `EmptyResultSet` when every station is excluded.
    pub fn build_series(records: &[ObservationRecord]) -> Result<Assembled, PipelineError> {
        assemble(group_by_station(records), BTreeSet::new())
    }

    /// Build one series per station in `requested`.
    ///
    /// Requested stations with no records at all are excluded; records for
    /// stations outside `requested` are ignored.
    pub fn build_series_for(
        requested: &BTreeSet<String>,
        records: &[ObservationRecord],
    ) -> Result<Assembled, PipelineError> {
        let mut grouped = group_by_station(records);
        grouped.retain(|station_id, points| {
            let keep = requested.contains(station_id);
            if !keep {
                debug!(
                    "Ignoring {} record(s) for unrequested station {}",
                    points.len(),
                    station_id
                );
            }
            keep
        });
        let without_records: BTreeSet<String> = requested
            .iter()
            .filter(|id| !grouped.contains_key(id.as_str()))
            .cloned()
            .collect();
        assemble(grouped, without_records)
    }

    fn assemble(
        grouped: BTreeMap<String, Vec<SeriesPoint>>,
        mut excluded: BTreeSet<String>,
    ) -> Result<Assembled, PipelineError> {
        let mut series = BTreeMap::new();
        for (station_id, mut points) in grouped {
            if points.windows(2).any(|w| w[1].date < w[0].date) {
                warn!("Records for {} are not in ascending date order", station_id);
            }
            trim_trailing_missing(&mut points);
            match EntitySeries::new(&station_id, points) {
                Some(s) => {
                    series.insert(station_id, s);
                }
                None => {
                    excluded.insert(station_id);
                }
            }
        }

        if !excluded.is_empty() {
            info!(
                "Excluded {} station(s) with no usable observations: {}",
                excluded.len(),
                excluded.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        if series.is_empty() {
            return Err(PipelineError::EmptyResultSet {
                excluded: excluded.len(),
            });
        }
        info!("Assembled {} station series", series.len());
        Ok(Assembled { series, excluded })
    }

}

/// Latest-known value per station, the feed for a map of current readings
pub mod latest {
    use chrono::NaiveDate;
    use nbs_core::series::EntitySeries;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct LatestValue {
        pub station_id: String,
        pub date: NaiveDate,
        pub value: f64,
    }

    /// One row per station, ordered by station id.
    pub fn latest_values(series: &BTreeMap<String, EntitySeries>) -> Vec<LatestValue> {
        series
            .iter()
            .map(|(station_id, s)| {
                let (date, value) = s.latest();
                LatestValue {
                    station_id: station_id.clone(),
                    date,
                    value,
                }
            })
            .collect()
    }

}
