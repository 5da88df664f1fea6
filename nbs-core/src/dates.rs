//! Date parsing and formatting shared by the sources and sinks.

use chrono::NaiveDate;

/// Format a NaiveDate as "YYYY-MM-DD"
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a date string in "YYYY-MM-DD" format
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
}

/// Parse a date string in "YYYYMMDD" format (CDEC compact format)
pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, "%Y%m%d")?)
}

/// Parse either "YYYY-MM-DD" or "YYYYMMDD". A trailing time-of-day
/// ("2024-01-15 00:00", "20240115 0000") is ignored.
pub fn parse_any_date(s: &str) -> anyhow::Result<NaiveDate> {
    let day = s.split_whitespace().next().unwrap_or("");
    if day.contains('-') {
        parse_date(day)
    } else {
        parse_date_compact(day)
    }
}
