//! File-backed stand-ins for the station API: candidate stations from
//! GeoJSON or CSV, observations from CSV.

use csv::{ReaderBuilder, Trim};
use geojson::{feature::Id, Feature, GeoJson, JsonObject};
use log::{debug, info, warn};
use nbs_core::{
    coordinate::Coordinate,
    date_range::DateWindow,
    dates::parse_any_date,
    observation::ObservationRecord,
    srs::{Srs, SrsParseError},
    station::Station,
};
use nbs_geo::{
    projection::{self, SrsDefinition},
    BoundingBox,
};
use std::{collections::BTreeSet, fs, path::Path};

use crate::error::{DataError, Result};

/// Supplies the candidate stations for a proximity query.
pub trait FeatureSource {
    fn features(&self) -> Result<Vec<Station>>;
}

/// Supplies observation records for a set of stations and a date window.
pub trait ObservationSource {
    /// `stations: None` means every station in the source.
    fn observations(
        &self,
        stations: Option<&BTreeSet<String>>,
        window: &DateWindow,
    ) -> Result<Vec<ObservationRecord>>;
}

/// Candidate stations from a GeoJSON FeatureCollection of Points.
///
/// A station's reference system comes from its `crs` property, else the
/// collection's legacy `crs` member, else `assume_srs`. A feature whose
/// stated crs cannot be parsed is skipped.
#[derive(Debug, Clone)]
pub struct GeoJsonFeatureSource {
    text: String,
    assume_srs: Option<Srs>,
    prefilter: Option<BoundingBox>,
}

impl GeoJsonFeatureSource {
    pub fn new(text: &str) -> Self {
        GeoJsonFeatureSource {
            text: text.to_string(),
            assume_srs: None,
            prefilter: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(GeoJsonFeatureSource::new(&fs::read_to_string(path)?))
    }

    pub fn with_assume_srs(mut self, srs: Option<Srs>) -> Self {
        self.assume_srs = srs;
        self
    }

    /// Drop geographic candidates outside `bbox` before selection.
    pub fn with_prefilter(mut self, bbox: Option<BoundingBox>) -> Self {
        self.prefilter = bbox;
        self
    }
}

impl FeatureSource for GeoJsonFeatureSource {
    fn features(&self) -> Result<Vec<Station>> {
        let geojson: GeoJson = self.text.parse()?;
        let (features, collection_srs) = match geojson {
            GeoJson::FeatureCollection(collection) => {
                let srs = collection.foreign_members.as_ref().and_then(legacy_crs);
                if let Some(Err(e)) = &srs {
                    warn!("Collection crs: {}", e);
                }
                (collection.features, srs)
            }
            GeoJson::Feature(feature) => (vec![feature], None),
            GeoJson::Geometry(_) => {
                return Err(DataError::InvalidFormat {
                    line: 1,
                    message: "expected a Feature or FeatureCollection, found a bare geometry"
                        .to_string(),
                })
            }
        };

        let mut stations = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            let Some(station_id) = feature_id(feature) else {
                warn!("Skipping feature #{}: no id", index);
                continue;
            };
            let Some((longitude, latitude)) = point_of(feature) else {
                warn!("Skipping {}: geometry is not a Point", station_id);
                continue;
            };
            // only an absent crs falls through to the next source
            let srs = match feature_srs(feature).or_else(|| collection_srs.clone()) {
                Some(Ok(srs)) => Some(srs),
                Some(Err(e)) => {
                    warn!("Skipping {}: {}", station_id, e);
                    continue;
                }
                None => self.assume_srs,
            };
            let name = feature
                .property("name")
                .and_then(|v| v.as_str())
                .map(String::from);
            stations.push(Station {
                station_id,
                name,
                location: Coordinate::new(latitude, longitude),
                srs,
            });
        }
        info!("Read {} candidate stations from GeoJSON", stations.len());
        Ok(apply_prefilter(stations, self.prefilter.as_ref()))
    }
}

/// Candidate stations from a `station_id,name,latitude,longitude,srs` CSV.
#[derive(Debug, Clone)]
pub struct CsvFeatureSource {
    text: String,
    assume_srs: Option<Srs>,
    prefilter: Option<BoundingBox>,
}

impl CsvFeatureSource {
    pub fn new(text: &str) -> Self {
        CsvFeatureSource {
            text: text.to_string(),
            assume_srs: None,
            prefilter: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(CsvFeatureSource::new(&fs::read_to_string(path)?))
    }

    pub fn with_assume_srs(mut self, srs: Option<Srs>) -> Self {
        self.assume_srs = srs;
        self
    }

    pub fn with_prefilter(mut self, bbox: Option<BoundingBox>) -> Self {
        self.prefilter = bbox;
        self
    }
}

impl FeatureSource for CsvFeatureSource {
    fn features(&self) -> Result<Vec<Station>> {
        let mut stations = Station::parse_station_csv(&self.text).map_err(|e| {
            DataError::InvalidFormat {
                line: 0,
                message: e.to_string(),
            }
        })?;
        for station in stations.iter_mut() {
            station.srs = station.srs.or(self.assume_srs);
        }
        info!("Read {} candidate stations from CSV", stations.len());
        Ok(apply_prefilter(stations, self.prefilter.as_ref()))
    }
}

/// Pick a candidate source by file extension: `.csv` is a station table,
/// anything else is read as GeoJSON.
pub fn feature_source_for_path(
    path: &Path,
    assume_srs: Option<Srs>,
    prefilter: Option<BoundingBox>,
) -> Result<Box<dyn FeatureSource>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(Box::new(
            CsvFeatureSource::from_path(path)?
                .with_assume_srs(assume_srs)
                .with_prefilter(prefilter),
        ))
    } else {
        Ok(Box::new(
            GeoJsonFeatureSource::from_path(path)?
                .with_assume_srs(assume_srs)
                .with_prefilter(prefilter),
        ))
    }
}

fn apply_prefilter(stations: Vec<Station>, bbox: Option<&BoundingBox>) -> Vec<Station> {
    let Some(bbox) = bbox else {
        return stations;
    };
    let before = stations.len();
    let kept: Vec<Station> = stations
        .into_iter()
        .filter(|station| {
            // projected or unreferenced locations are left to the radius test
            let geographic = station
                .srs
                .and_then(|srs| projection::lookup(&srs))
                .is_some_and(|d| d == SrsDefinition::Geographic);
            !geographic || bbox.contains(&station.location)
        })
        .collect();
    debug!("Bounding box kept {} of {} candidates", kept.len(), before);
    kept
}

fn feature_id(feature: &Feature) -> Option<String> {
    match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => ["station_id", "id"].iter().find_map(|key| {
            feature.property(key).and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        }),
    }
}

fn point_of(feature: &Feature) -> Option<(f64, f64)> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(position) if position.len() >= 2 => Some((position[0], position[1])),
        _ => None,
    }
}

/// `None` when the feature states no crs at all.
fn feature_srs(feature: &Feature) -> Option<std::result::Result<Srs, SrsParseError>> {
    match feature.property("crs") {
        Some(serde_json::Value::String(name)) => Some(name.parse()),
        Some(serde_json::Value::Null) | None => {
            feature.foreign_members.as_ref().and_then(legacy_crs)
        }
        Some(other) => Some(Err(SrsParseError(other.to_string()))),
    }
}

/// `"crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}}`
fn legacy_crs(members: &JsonObject) -> Option<std::result::Result<Srs, SrsParseError>> {
    let crs = members.get("crs")?;
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str());
    Some(match name {
        Some(name) => name.parse(),
        None => Err(SrsParseError(crs.to_string())),
    })
}

/// Observation records from a headered `station_id,date,value` CSV.
///
/// Dates may be `YYYY-MM-DD` or compact `YYYYMMDD`; empty, `NaN`, `null`
/// and `---` values are missing.
#[derive(Debug, Clone)]
pub struct CsvObservationSource {
    text: String,
}

impl CsvObservationSource {
    pub fn new(text: &str) -> Self {
        CsvObservationSource {
            text: text.to_string(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(CsvObservationSource::new(&fs::read_to_string(path)?))
    }
}

impl ObservationSource for CsvObservationSource {
    fn observations(
        &self,
        stations: Option<&BTreeSet<String>>,
        window: &DateWindow,
    ) -> Result<Vec<ObservationRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(self.text.as_bytes());

        let mut records = Vec::new();
        for (index, row) in rdr.records().enumerate() {
            let record = row?;
            // header is line 1
            let line = index + 2;
            let station_id = match record.get(0) {
                Some(id) if !id.is_empty() => id,
                _ => {
                    return Err(DataError::InvalidFormat {
                        line,
                        message: "missing station_id".to_string(),
                    })
                }
            };
            let raw_date = record.get(1).unwrap_or("");
            let date = parse_any_date(raw_date).map_err(|_| DataError::DateParse {
                line,
                value: raw_date.to_string(),
            })?;
            let raw_value = record.get(2).unwrap_or("");
            let value = ObservationRecord::parse_value(raw_value).map_err(|e| {
                DataError::InvalidFormat {
                    line,
                    message: format!("value {:?}: {}", raw_value, e),
                }
            })?;

            if !window.contains(&date) {
                continue;
            }
            if stations.is_some_and(|wanted| !wanted.contains(station_id)) {
                continue;
            }
            records.push(ObservationRecord::new(station_id, date, value));
        }
        info!(
            "Read {} observation records between {} and {}",
            records.len(),
            window.start(),
            window.end()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nbs_core::srs::WGS84;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" } },
        "features": [
            { "type": "Feature", "id": "FOL",
              "geometry": { "type": "Point", "coordinates": [-121.183, 38.683] },
              "properties": { "name": "Folsom Lake" } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [-121.74, 38.54] },
              "properties": { "station_id": "DVS" } },
            { "type": "Feature", "id": 42,
              "geometry": { "type": "Point", "coordinates": [-13523000.0, 4663000.0] },
              "properties": { "crs": "EPSG:3857" } },
            { "type": "Feature", "id": "LINE",
              "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
              "properties": {} },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
              "properties": {} }
        ]
    }"#;

    fn window(start: u32, end: u32) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, start).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_geojson_features() {
        let stations = GeoJsonFeatureSource::new(COLLECTION).features().unwrap();
        assert_eq!(stations.len(), 3);

        assert_eq!(stations[0].station_id, "FOL");
        assert_eq!(stations[0].name.as_deref(), Some("Folsom Lake"));
        assert_eq!(stations[0].location, Coordinate::new(38.683, -121.183));
        assert_eq!(stations[0].srs, Some(WGS84));

        assert_eq!(stations[1].station_id, "DVS");
        assert_eq!(stations[2].station_id, "42");
        assert_eq!(stations[2].srs, Some(Srs(3857)));
    }

    #[test]
    fn test_unparseable_crs_is_not_replaced() {
        let text = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" } },
            "features": [
                { "type": "Feature", "id": "ALB",
                  "geometry": { "type": "Point", "coordinates": [-2000000.0, 1800000.0] },
                  "properties": { "crs": "ESRI:102003" } },
                { "type": "Feature", "id": "FOL",
                  "geometry": { "type": "Point", "coordinates": [-121.183, 38.683] },
                  "properties": {} }
            ]
        }"#;
        let stations = GeoJsonFeatureSource::new(text)
            .with_assume_srs(Some(WGS84))
            .features()
            .unwrap();
        let ids: Vec<&str> = stations.iter().map(|s| s.station_id.as_str()).collect();
        assert_eq!(ids, vec!["FOL"]);
        assert_eq!(stations[0].srs, Some(WGS84));
    }

    #[test]
    fn test_unparseable_collection_crs_skips_its_features() {
        let text = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "local grid" } },
            "features": [
                { "type": "Feature", "id": "A",
                  "geometry": { "type": "Point", "coordinates": [1000.0, 2000.0] },
                  "properties": {} },
                { "type": "Feature", "id": "B",
                  "geometry": { "type": "Point", "coordinates": [-121.0, 38.0] },
                  "properties": { "crs": "EPSG:4326" } }
            ]
        }"#;
        let stations = GeoJsonFeatureSource::new(text)
            .with_assume_srs(Some(WGS84))
            .features()
            .unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "B");
    }

    #[test]
    fn test_geojson_without_crs_uses_assumed() {
        let text = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "id": "A",
              "geometry": { "type": "Point", "coordinates": [18.07, 59.33] }, "properties": null } ] }"#;
        let bare = GeoJsonFeatureSource::new(text).features().unwrap();
        assert_eq!(bare[0].srs, None);
        let assumed = GeoJsonFeatureSource::new(text)
            .with_assume_srs(Some(WGS84))
            .features()
            .unwrap();
        assert_eq!(assumed[0].srs, Some(WGS84));
    }

    #[test]
    fn test_geojson_prefilter() {
        let center = Coordinate::new(38.58, -121.49);
        let stations = GeoJsonFeatureSource::new(COLLECTION)
            .with_prefilter(Some(BoundingBox::around(&center, 10.0)))
            .features()
            .unwrap();
        let ids: Vec<&str> = stations.iter().map(|s| s.station_id.as_str()).collect();
        // FOL (~29 km) and DVS (~22 km) fall outside a 10 km box; the
        // projected EPSG:3857 point is left for the radius test
        assert_eq!(ids, vec!["42"]);
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let text = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(matches!(
            GeoJsonFeatureSource::new(text).features(),
            Err(DataError::InvalidFormat { .. })
        ));
        assert!(matches!(
            GeoJsonFeatureSource::new("not json").features(),
            Err(DataError::GeoJson(_))
        ));
    }

    #[test]
    fn test_csv_unparseable_srs_is_not_assumed() {
        let text = "station_id,name,latitude,longitude,srs\n\
                    MRC,Mercator,4662000,-13524000,web mercator\n\
                    GRZ,Grizzly Peak,38.75,-120.25,\n";
        let stations = CsvFeatureSource::new(text)
            .with_assume_srs(Some(WGS84))
            .features()
            .unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "GRZ");
        assert_eq!(stations[0].srs, Some(WGS84));
    }

    #[test]
    fn test_csv_features() {
        let text = "station_id,name,latitude,longitude,srs\nGRZ,Grizzly Peak,38.75,-120.25,\n";
        let stations = CsvFeatureSource::new(text)
            .with_assume_srs(Some(WGS84))
            .features()
            .unwrap();
        assert_eq!(stations[0].srs, Some(WGS84));
    }

    const OBSERVATIONS: &str = "\
station_id,date,value
FOL,2023-12-31,1.0
FOL,2024-01-01,2.0
FOL,20240102,---
DVS,2024-01-01,
DVS,2024-01-02 00:00,NaN
SHA,2024-01-01,7.5
";

    #[test]
    fn test_csv_observations_window_and_stations() {
        let source = CsvObservationSource::new(OBSERVATIONS);
        let all = source.observations(None, &window(1, 2)).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.date >= NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));

        let wanted: BTreeSet<String> = ["FOL".to_string()].into_iter().collect();
        let fol = source.observations(Some(&wanted), &window(1, 2)).unwrap();
        assert_eq!(fol.len(), 2);
        assert_eq!(fol[0].value, Some(2.0));
        assert_eq!(fol[1].value, None);
    }

    #[test]
    fn test_csv_observations_bad_rows() {
        let bad_date = "station_id,date,value\nFOL,01/02/2024,1.0\n";
        match CsvObservationSource::new(bad_date).observations(None, &window(1, 2)) {
            Err(DataError::DateParse { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "01/02/2024");
            }
            other => panic!("unexpected {:?}", other),
        }

        let bad_value = "station_id,date,value\nFOL,2024-01-01,1.0\nFOL,2024-01-02,BRT\n";
        assert!(matches!(
            CsvObservationSource::new(bad_value).observations(None, &window(1, 2)),
            Err(DataError::InvalidFormat { line: 3, .. })
        ));
    }
}
