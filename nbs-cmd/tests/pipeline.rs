use chrono::NaiveDate;
use clap::Parser;
use nbs_cmd::{
    config::QueryConfig,
    pipeline::{run_full, run_pipeline, RunOutputs},
    source::{CsvObservationSource, GeoJsonFeatureSource},
    Command,
};
use nbs_core::{
    coordinate::Coordinate,
    error::{ErrorKind, PipelineError},
    station::Station,
};
use nbs_geo::NativeGeometry;
use std::{collections::BTreeSet, fs};

const STATIONS: &str = include_str!("../../fixtures/stations.geojson");
const OBSERVATIONS: &str = include_str!("../../fixtures/observations.csv");
const QUERY: &str = include_str!("../../fixtures/query.json");

fn ids(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn query() -> QueryConfig {
    serde_json::from_str(QUERY).unwrap()
}

#[test]
fn test_fixture_run() {
    let output = run_pipeline(
        &NativeGeometry,
        &query(),
        &GeoJsonFeatureSource::new(STATIONS),
        &CsvObservationSource::new(OBSERVATIONS),
    )
    .unwrap();

    let selected: BTreeSet<String> = output.stations.iter().map(|s| s.station_id.clone()).collect();
    assert_eq!(selected, ids(&["AUB", "CMN", "DVS", "FOL"]));
    assert_eq!(output.excluded, ids(&["DVS"]));
    assert_eq!(
        output.selection.iter().cloned().collect::<BTreeSet<String>>(),
        ids(&["AUB", "CMN", "FOL"])
    );

    // out-of-window rows are dropped, nothing is trimmed
    let fol = &output.series["FOL"];
    assert_eq!(fol.len(), 5);
    assert_eq!(fol.latest().1, 413.0);

    // trailing gaps trimmed
    let cmn = &output.series["CMN"];
    assert_eq!(cmn.len(), 3);
    assert_eq!(cmn.last_date(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

    // leading and interior gaps kept
    let aub: Vec<Option<f64>> = output.series["AUB"].points().iter().map(|p| p.value).collect();
    assert_eq!(aub, vec![None, Some(5.2), None, Some(6.1)]);
}

#[test]
fn test_same_result_with_default_target() {
    let albers = query();
    let local = QueryConfig {
        target_srs: None,
        ..query()
    };
    let features = GeoJsonFeatureSource::new(STATIONS);
    let observations = CsvObservationSource::new(OBSERVATIONS);
    let a = run_pipeline(&NativeGeometry, &albers, &features, &observations).unwrap();
    let b = run_pipeline(&NativeGeometry, &local, &features, &observations).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_no_station_within_small_radius() {
    let config = QueryConfig {
        center: Some(Coordinate::new(37.0, -119.0)),
        radius_km: Some(10.0),
        ..query()
    };
    let err = run_pipeline(
        &NativeGeometry,
        &config,
        &GeoJsonFeatureSource::new(STATIONS),
        &CsvObservationSource::new(OBSERVATIONS),
    )
    .unwrap_err();
    let pipeline = err.downcast_ref::<PipelineError>().unwrap();
    assert!(matches!(pipeline, PipelineError::NoneWithinRadius { .. }));
    assert_eq!(pipeline.kind(), ErrorKind::NoData);
}

#[test]
fn test_run_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = dir.path().join("stations.geojson");
    let observations = dir.path().join("observations.csv");
    fs::write(&candidates, STATIONS).unwrap();
    fs::write(&observations, OBSERVATIONS).unwrap();

    let outputs = RunOutputs {
        series: Some(dir.path().join("series.csv")),
        latest: Some(dir.path().join("latest.csv")),
        table: Some(dir.path().join("table.csv")),
        summary: Some(dir.path().join("summary.json")),
    };
    run_full(&NativeGeometry, &query(), &candidates, &observations, true, &outputs).unwrap();

    let series = fs::read_to_string(dir.path().join("series.csv")).unwrap();
    assert!(series.starts_with("station_id,date,value\nAUB,2024-01-01,\n"));
    assert!(!series.contains("DVS"));

    let latest = fs::read_to_string(dir.path().join("latest.csv")).unwrap();
    assert_eq!(
        latest.lines().collect::<Vec<_>>(),
        vec![
            "station_id,name,latitude,longitude,date,value",
            "AUB,Auburn,38.9,-121.07,2024-01-04,6.1",
            "CMN,Camanche,38.22,-121.02,2024-01-03,221.3",
            "FOL,Folsom Lake,38.683,-121.183,2024-01-05,413",
        ]
    );

    let table = fs::read_to_string(dir.path().join("table.csv")).unwrap();
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], "date,AUB,CMN,FOL");
    assert_eq!(rows[5], "2024-01-05,,,413");

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["excluded"], serde_json::json!(["DVS"]));
    assert_eq!(summary["selection"], serde_json::json!(["AUB", "CMN", "FOL"]));
    assert_eq!(summary["present"], serde_json::json!({"AUB": 2, "CMN": 3, "FOL": 5}));
}

#[test]
fn test_select_command_from_query_file() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = dir.path().join("stations.geojson");
    let query_path = dir.path().join("query.json");
    let output = dir.path().join("selected.csv");
    fs::write(&candidates, STATIONS).unwrap();
    fs::write(&query_path, QUERY).unwrap();

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }
    let cli = Cli::try_parse_from([
        "nbs-cli",
        "select",
        "--candidates",
        candidates.to_str().unwrap(),
        "--query",
        query_path.to_str().unwrap(),
        "--radius-km",
        "30",
        "--output",
        output.to_str().unwrap(),
    ])
    .unwrap();
    nbs_cmd::run(cli.command).unwrap();

    let stations = Station::parse_station_csv(&fs::read_to_string(&output).unwrap()).unwrap();
    let selected: Vec<&str> = stations.iter().map(|s| s.station_id.as_str()).collect();
    assert_eq!(selected, vec!["FOL", "DVS"]);
}

#[test]
fn test_invalid_radius_flag_is_configuration_error() {
    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }
    let cli = Cli::try_parse_from([
        "nbs-cli",
        "select",
        "--candidates",
        "unused.geojson",
        "--lat",
        "38.58",
        "--lon",
        "-121.49",
        "--radius-km=-1",
    ])
    .unwrap();
    let err = nbs_cmd::run(cli.command).unwrap_err();
    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::InvalidRadius(-1.0))
    );
}
