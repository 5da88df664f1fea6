/// Error types for reading candidates/observations and writing results
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// Failed to read or write a file
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or write CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse GeoJSON
    #[error("Failed to parse GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Failed to write JSON
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Date parsing failed
    #[error("line {line}: failed to parse date {value:?}")]
    DateParse { line: usize, value: String },

    /// Invalid data format
    #[error("line {line}: invalid data format: {message}")]
    InvalidFormat { line: usize, message: String },
}

/// Type alias for Results using DataError
pub type Result<T> = std::result::Result<T, DataError>;
