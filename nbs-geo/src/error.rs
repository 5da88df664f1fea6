use nbs_core::srs::Srs;
use thiserror::Error;

/// Errors from the reprojection capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The reference system is not in the registry
    #[error("unknown spatial reference system {0}")]
    UnknownSrs(Srs),

    /// A distance test was asked for in a geographic system
    #[error("{0} is geographic, not a planar projection")]
    NotPlanar(Srs),

    /// The point cannot be represented in the target system
    #[error("point ({x}, {y}) is outside the domain of {srs}")]
    OutOfDomain { x: f64, y: f64, srs: Srs },

    /// The point is too far from the meridian of a query-centred projection
    #[error("({lon}, {lat}) is too far from central meridian {central_meridian} to project")]
    OutsideLocalProjection {
        lon: f64,
        lat: f64,
        central_meridian: f64,
    },

    /// Failure reported by an external projection library
    #[error("projection backend error: {0}")]
    Backend(String),
}
