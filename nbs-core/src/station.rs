use csv::ReaderBuilder;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{coordinate::Coordinate, srs::Srs};

/// A candidate observation station: a point feature with an identifier,
/// a location and the spatial reference system its location is stated in.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    /// Station identifier (e.g., "GRZ" for Grizzly Peak)
    pub station_id: String,
    /// Human-readable name of the station, when the source has one
    pub name: Option<String>,
    /// Location in the station's own reference system. For a projected
    /// `srs` the latitude slot holds the northing and the longitude slot
    /// the easting.
    pub location: Coordinate,
    /// Reference system of `location`; `None` when the source did not state one
    pub srs: Option<Srs>,
}

impl Station {
    pub fn new(station_id: &str, latitude: f64, longitude: f64, srs: Option<Srs>) -> Self {
        Station {
            station_id: station_id.to_string(),
            name: None,
            location: Coordinate::new(latitude, longitude),
            srs,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Parse a CSV string of station metadata into a vector of Stations.
    ///
    /// Expected CSV columns: station_id, name, latitude, longitude, srs.
    /// An empty `srs` cell leaves the station without a reference system;
    /// a row naming one that cannot be parsed is skipped.
    pub fn parse_station_csv(csv_object: &str) -> anyhow::Result<Vec<Station>> {
        let mut station_list: Vec<Station> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_object.as_bytes());
        for (line, row) in rdr.records().enumerate() {
            let record = row?;
            let station_id = record.get(0).unwrap_or("").trim();
            if station_id.is_empty() {
                anyhow::bail!("row {}: missing station_id", line + 1);
            }
            let name = record
                .get(1)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);
            let latitude = parse_degrees(record.get(2), "latitude", line + 1)?;
            let longitude = parse_degrees(record.get(3), "longitude", line + 1)?;
            let srs = match record.get(4).map(str::trim).filter(|s| !s.is_empty()) {
                None => None,
                Some(name) => match name.parse::<Srs>() {
                    Ok(srs) => Some(srs),
                    Err(e) => {
                        warn!("row {}: skipping {}: {}", line + 1, station_id, e);
                        continue;
                    }
                },
            };
            station_list.push(Station {
                station_id: station_id.to_string(),
                name,
                location: Coordinate::new(latitude, longitude),
                srs,
            });
        }
        Ok(station_list)
    }
}

fn parse_degrees(cell: Option<&str>, column: &str, line: usize) -> anyhow::Result<f64> {
    let raw = cell.unwrap_or("").trim();
    raw.parse::<f64>()
        .map_err(|_| anyhow::anyhow!("row {}: bad {} {:?}", line, column, raw))
}
