use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use std::mem::replace;

use crate::error::PipelineError;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// Closed calendar-day interval `[start, end]` that observations are
/// requested for.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    /// Every day of the window, in order.
    pub fn days(&self) -> DateRange {
        DateRange(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::{DateRange, DateWindow};
    use chrono::NaiveDate;

    #[test]
    fn test_date_range_iteration() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        let range = DateRange(start, end);
        let dates: Vec<NaiveDate> = range.collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start);
        assert_eq!(dates[4], end);
    }

    #[test]
    fn test_date_range_empty() {
        let start = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        let range = DateRange(start, end);
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_window_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = DateWindow::new(start, end).unwrap();
        assert!(window.contains(&start));
        assert!(window.contains(&end));
        assert!(!window.contains(&NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()));
        // leap day included
        assert_eq!(window.days().count(), 4);
    }

    #[test]
    fn test_window_single_day() {
        let day = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let window = DateWindow::new(day, day).unwrap();
        assert_eq!(window.days().collect::<Vec<_>>(), vec![day]);
    }

    #[test]
    fn test_window_rejects_inverted() {
        let start = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        assert!(DateWindow::new(start, end).is_err());
    }
}
