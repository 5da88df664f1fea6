//! Query configuration: a JSON file, CLI flags, or both (flags win).

use chrono::NaiveDate;
use clap::Args;
use nbs_core::{
    coordinate::Coordinate,
    date_range::DateWindow,
    error::PipelineError,
    srs::{Srs, WGS84},
};
use nbs_geo::{projection, SelectorOptions};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Everything a run needs to know about where and when to look.
///
/// All fields are optional so a query file and command-line flags can each
/// supply part of it; the accessors report what is still missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub center: Option<Coordinate>,
    /// Reference system of `center` (default EPSG:4326)
    pub center_srs: Option<Srs>,
    pub radius_km: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Planar system for the radius test (default: transverse Mercator on the center's meridian)
    pub target_srs: Option<Srs>,
    /// Reference system for candidates that do not state one
    pub assume_srs: Option<Srs>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid query JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration failed: missing `{field}` (pass --{flag} or set it in the query file)")]
    Missing {
        field: &'static str,
        flag: &'static str,
    },
    #[error(transparent)]
    Invalid(#[from] PipelineError),
}

impl QueryConfig {
    /// Load a query from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Field-wise overlay: values set in `overrides` replace ours.
    pub fn merge(self, overrides: QueryConfig) -> QueryConfig {
        QueryConfig {
            center: overrides.center.or(self.center),
            center_srs: overrides.center_srs.or(self.center_srs),
            radius_km: overrides.radius_km.or(self.radius_km),
            start_date: overrides.start_date.or(self.start_date),
            end_date: overrides.end_date.or(self.end_date),
            target_srs: overrides.target_srs.or(self.target_srs),
            assume_srs: overrides.assume_srs.or(self.assume_srs),
        }
    }

    pub fn center(&self) -> Result<Coordinate, ConfigError> {
        let center = self.center.ok_or(ConfigError::Missing {
            field: "center",
            flag: "lat/--lon",
        })?;
        let planar = self
            .center_srs
            .and_then(|srs| projection::lookup(&srs))
            .is_some_and(|definition| definition.is_planar());
        if !planar {
            center.validate()?;
        } else if !center.is_finite() {
            return Err(PipelineError::InvalidCoordinate {
                latitude: center.latitude,
                longitude: center.longitude,
            }
            .into());
        }
        Ok(center)
    }

    pub fn radius_km(&self) -> Result<f64, ConfigError> {
        let radius_km = self.radius_km.ok_or(ConfigError::Missing {
            field: "radius_km",
            flag: "radius-km",
        })?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(PipelineError::InvalidRadius(radius_km).into());
        }
        Ok(radius_km)
    }

    pub fn window(&self) -> Result<DateWindow, ConfigError> {
        let start = self.start_date.ok_or(ConfigError::Missing {
            field: "start_date",
            flag: "start",
        })?;
        let end = self.end_date.ok_or(ConfigError::Missing {
            field: "end_date",
            flag: "end",
        })?;
        Ok(DateWindow::new(start, end)?)
    }

    pub fn selector_options(&self) -> SelectorOptions {
        SelectorOptions {
            center_srs: self.center_srs.unwrap_or(WGS84),
            target_srs: self.target_srs,
        }
    }

    /// Check everything a select-only run needs.
    pub fn validate_selection(&self) -> Result<(), ConfigError> {
        self.center()?;
        self.radius_km()?;
        Ok(())
    }

    /// Check everything a full run needs, before any data is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_selection()?;
        self.window()?;
        Ok(())
    }
}

/// Query flags shared by the `select` and `run` subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// JSON query file; the flags below override its fields
    #[arg(short = 'q', long)]
    pub query: Option<PathBuf>,

    /// Center latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Center longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Selection radius in kilometres
    #[arg(long)]
    pub radius_km: Option<f64>,

    /// First day of the observation window (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the observation window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Reference system of the center (default EPSG:4326)
    #[arg(long)]
    pub center_srs: Option<Srs>,

    /// Planar reference system for the radius test
    #[arg(long)]
    pub target_srs: Option<Srs>,

    /// Reference system for candidates that do not state one
    #[arg(long)]
    pub assume_srs: Option<Srs>,
}

impl QueryArgs {
    /// Load the query file (if any) and overlay the flags on it.
    pub fn resolve(&self) -> Result<QueryConfig, ConfigError> {
        let base = match &self.query {
            Some(path) => QueryConfig::load(path)?,
            None => QueryConfig::default(),
        };
        let center = match (self.lat, self.lon, base.center) {
            (Some(lat), Some(lon), _) => Some(Coordinate::new(lat, lon)),
            (Some(lat), None, Some(c)) => Some(Coordinate::new(lat, c.longitude)),
            (None, Some(lon), Some(c)) => Some(Coordinate::new(c.latitude, lon)),
            (None, None, c) => c,
            _ => {
                return Err(ConfigError::Missing {
                    field: "center",
                    flag: "lat/--lon",
                })
            }
        };
        Ok(base.merge(QueryConfig {
            center,
            center_srs: self.center_srs,
            radius_km: self.radius_km,
            start_date: self.start,
            end_date: self.end,
            target_srs: self.target_srs,
            assume_srs: self.assume_srs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbs_core::error::ErrorKind;

    const QUERY_JSON: &str = r#"{
        "center": { "latitude": 38.58, "longitude": -121.49 },
        "radius_km": 100.0,
        "start_date": "2024-01-01",
        "end_date": "2024-01-31",
        "target_srs": "EPSG:3310"
    }"#;

    #[test]
    fn test_parse_query_json() {
        let config: QueryConfig = serde_json::from_str(QUERY_JSON).unwrap();
        assert_eq!(config.center().unwrap(), Coordinate::new(38.58, -121.49));
        assert_eq!(config.radius_km().unwrap(), 100.0);
        assert_eq!(config.window().unwrap().days().count(), 31);
        let options = config.selector_options();
        assert_eq!(options.center_srs, WGS84);
        assert_eq!(options.target_srs, Some(Srs(3310)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<QueryConfig, _> = serde_json::from_str(r#"{ "radius": 10 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let base: QueryConfig = serde_json::from_str(QUERY_JSON).unwrap();
        let merged = base.merge(QueryConfig {
            radius_km: Some(25.0),
            ..QueryConfig::default()
        });
        assert_eq!(merged.radius_km, Some(25.0));
        assert_eq!(merged.center, Some(Coordinate::new(38.58, -121.49)));
    }

    #[test]
    fn test_args_without_file() {
        let args = QueryArgs {
            lat: Some(59.33),
            lon: Some(18.07),
            radius_km: Some(50.0),
            ..QueryArgs::default()
        };
        let config = args.resolve().unwrap();
        assert!(config.validate_selection().is_ok());
        assert!(matches!(
            config.window(),
            Err(ConfigError::Missing { field: "start_date", .. })
        ));
    }

    #[test]
    fn test_half_a_center_is_missing() {
        let args = QueryArgs {
            lat: Some(59.33),
            ..QueryArgs::default()
        };
        assert!(matches!(args.resolve(), Err(ConfigError::Missing { field: "center", .. })));
    }

    #[test]
    fn test_invalid_values() {
        let config = QueryConfig {
            center: Some(Coordinate::new(38.58, -121.49)),
            radius_km: Some(-5.0),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..QueryConfig::default()
        };
        match config.radius_km() {
            Err(ConfigError::Invalid(e)) => assert_eq!(e.kind(), ErrorKind::Configuration),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            config.window(),
            Err(ConfigError::Invalid(PipelineError::InvalidWindow { .. }))
        ));
    }
}
