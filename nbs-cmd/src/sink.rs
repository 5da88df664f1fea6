//! Writers for the assembled result: long and wide CSV, the latest-value
//! map feed and a JSON run summary.

use csv::Writer;
use nbs_core::{
    date_range::DateWindow,
    dates::format_date,
    series::{EntitySeries, SelectionSet},
    station::Station,
};
use nbs_series::latest::{latest_values, LatestValue};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
};

use crate::error::Result;

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Long format: `station_id,date,value`, stations in id order.
pub fn write_series_csv<W: Write>(
    writer: W,
    series: &BTreeMap<String, EntitySeries>,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["station_id", "date", "value"])?;
    for (station_id, s) in series {
        for point in s.points() {
            wtr.write_record([
                station_id.as_str(),
                format_date(&point.date).as_str(),
                cell(point.value).as_str(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Selected candidates as `station_id,name,latitude,longitude,srs`, the
/// same layout the CSV candidate source reads.
pub fn write_stations_csv<W: Write>(writer: W, stations: &[Station]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["station_id", "name", "latitude", "longitude", "srs"])?;
    for station in stations {
        wtr.write_record([
            station.station_id.as_str(),
            station.name.as_deref().unwrap_or(""),
            station.location.latitude.to_string().as_str(),
            station.location.longitude.to_string().as_str(),
            station.srs.map(|srs| srs.to_string()).unwrap_or_default().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per surviving station with its last reading and location.
pub fn write_latest_csv<W: Write>(
    writer: W,
    series: &BTreeMap<String, EntitySeries>,
    stations: &[Station],
) -> Result<()> {
    let by_id: BTreeMap<&str, &Station> = stations
        .iter()
        .map(|s| (s.station_id.as_str(), s))
        .collect();
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["station_id", "name", "latitude", "longitude", "date", "value"])?;
    for latest in latest_values(series) {
        let station = by_id.get(latest.station_id.as_str());
        let name = station.and_then(|s| s.name.clone()).unwrap_or_default();
        let (latitude, longitude) = match station {
            Some(s) => (s.location.latitude.to_string(), s.location.longitude.to_string()),
            None => (String::new(), String::new()),
        };
        wtr.write_record([
            latest.station_id.as_str(),
            name.as_str(),
            latitude.as_str(),
            longitude.as_str(),
            format_date(&latest.date).as_str(),
            latest.value.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Wide format: a `date` column then one column per station, one row for
/// every day of the window. Days a station has no value for are empty.
pub fn write_table_csv<W: Write>(
    writer: W,
    series: &BTreeMap<String, EntitySeries>,
    window: &DateWindow,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(series.keys().cloned());
    wtr.write_record(&header)?;
    for date in window.days() {
        let mut row = vec![format_date(&date)];
        row.extend(series.values().map(|s| cell(s.value_on(&date))));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// What a run selected and dropped, with each survivor's latest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub window: DateWindow,
    pub selection: SelectionSet,
    pub excluded: BTreeSet<String>,
    /// Days with a reading, per surviving station.
    pub present: BTreeMap<String, usize>,
    pub latest: Vec<LatestValue>,
}

impl RunSummary {
    pub fn new(
        window: DateWindow,
        selection: SelectionSet,
        excluded: BTreeSet<String>,
        series: &BTreeMap<String, EntitySeries>,
    ) -> Self {
        RunSummary {
            window,
            selection,
            excluded,
            present: series
                .iter()
                .map(|(id, s)| (id.clone(), s.present_count()))
                .collect(),
            latest: latest_values(series),
        }
    }
}

pub fn write_summary_json<W: Write>(mut writer: W, summary: &RunSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    Ok(())
}
