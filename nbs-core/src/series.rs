use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One (date, value) step of a station's series. `value` is `None` for an
/// interior or leading gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// A cleaned, chronologically ordered series for one station.
///
/// Never empty, and the last point always carries a value. The only way to
/// build one is [`EntitySeries::new`], which refuses anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySeries {
    station_id: String,
    points: Vec<SeriesPoint>,
}

impl EntitySeries {
    /// Returns `None` when `points` is empty or ends in a missing value.
    pub fn new(station_id: &str, points: Vec<SeriesPoint>) -> Option<Self> {
        match points.last() {
            Some(SeriesPoint { value: Some(_), .. }) => Some(EntitySeries {
                station_id: station_id.to_string(),
                points,
            }),
            _ => None,
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.latest().0
    }

    /// Latest known observation.
    pub fn latest(&self) -> (NaiveDate, f64) {
        let last = &self.points[self.points.len() - 1];
        // EntitySeries::new guarantees the last point has a value
        (last.date, last.value.unwrap_or(f64::NAN))
    }

    /// Number of points with a value.
    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// Value recorded on `date`, if any.
    pub fn value_on(&self, date: &NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.date == *date)
            .and_then(|p| p.value)
    }
}

/// Station identifiers that passed both the radius test and the
/// usable-series filter. Built once per run, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionSet(BTreeSet<String>);

impl SelectionSet {
    pub fn new(selected: &BTreeSet<String>, series: &BTreeMap<String, EntitySeries>) -> Self {
        SelectionSet(
            selected
                .iter()
                .filter(|id| series.contains_key(id.as_str()))
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.0.contains(station_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}
