//! Planar reprojection and radius selection of candidate stations.
//!
//! ```text
//! Geographic (lat/lon)  ->  Projected (TM / Albers)  ->  circle test
//!   station coordinates       easting/northing metres      distance <= radius
//! ```

pub mod error;
pub mod ops;
pub mod projection;
pub mod proximity;

pub use error::ProjectionError;
pub use ops::{GeometryOps, NativeGeometry};
pub use proximity::{select_within_radius, select_within_radius_with, BoundingBox, SelectorOptions};
