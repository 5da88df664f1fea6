pub mod coordinate;
pub mod date_range;
pub mod dates;
pub mod error;
pub mod observation;
pub mod series;
pub mod srs;
pub mod station;
