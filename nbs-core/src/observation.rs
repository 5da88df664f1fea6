use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cell contents that sources use for "no value recorded".
/// `---` is the CDEC dash marker.
pub const MISSING_MARKERS: [&str; 7] = ["", "nan", "null", "n/a", "na", "---", "none"];

/// A single dated observation for one station.
///
/// `value` is `None` when the source recorded nothing; NaN is folded into
/// `None` on construction so downstream code only has one notion of missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub station_id: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl ObservationRecord {
    pub fn new(station_id: &str, date: NaiveDate, value: Option<f64>) -> Self {
        ObservationRecord {
            station_id: station_id.to_string(),
            date,
            value: value.filter(|v| !v.is_nan()),
        }
    }

    /// Parse a value cell. Missing markers yield `Ok(None)`, anything else
    /// that is not a number is an error.
    pub fn parse_value(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
        let lowered = cell.trim().to_lowercase();
        if MISSING_MARKERS.contains(&lowered.as_str()) {
            return Ok(None);
        }
        let value = lowered.parse::<f64>()?;
        Ok(Some(value).filter(|v| !v.is_nan()))
    }
}
