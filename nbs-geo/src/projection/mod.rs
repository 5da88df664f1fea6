//! # Built-in Projections
//!
//! A small registry of EPSG codes this crate can reproject between without
//! any C dependency.
//!
//! ## Geographic
//! - EPSG:4326 WGS84
//! - EPSG:4258 ETRS89
//! - EPSG:4269 NAD83
//!
//! ## Planar
//! - EPSG:3006 SWEREF99 TM
//! - EPSG:32601-32660 / 32701-32760 WGS84 UTM north / south
//! - EPSG:3310 NAD83 California Albers
//! - EPSG:5070 NAD83 CONUS Albers
//!
//! Datum shifts between WGS84, ETRS89 and NAD83 are ignored; they amount to
//! a metre or two, far below what a kilometre-scale radius query resolves.

mod albers;
mod transverse_mercator;

pub use albers::AlbersEqualArea;
pub use transverse_mercator::TransverseMercator;

use nbs_core::srs::Srs;

use crate::error::ProjectionError;

/// Reference ellipsoid given by semi-major axis (metres) and flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major: f64,
    pub flattening: f64,
}

pub const WGS84_ELLIPSOID: Ellipsoid = Ellipsoid {
    semi_major: 6_378_137.0,
    flattening: 1.0 / 298.257_223_563,
};

pub const GRS80_ELLIPSOID: Ellipsoid = Ellipsoid {
    semi_major: 6_378_137.0,
    flattening: 1.0 / 298.257_222_101,
};

impl Ellipsoid {
    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }
}

/// How a registered SRS maps to longitude/latitude.
#[derive(Debug, Clone, PartialEq)]
pub enum SrsDefinition {
    Geographic,
    TransverseMercator(TransverseMercator),
    Albers(AlbersEqualArea),
}

impl SrsDefinition {
    pub fn is_planar(&self) -> bool {
        !matches!(self, SrsDefinition::Geographic)
    }

    /// (lon, lat) degrees -> (x, y) in this system
    pub fn forward(&self, srs: Srs, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        let projected = match self {
            SrsDefinition::Geographic => Some((lon, lat)),
            SrsDefinition::TransverseMercator(tm) => tm.forward(lon, lat),
            SrsDefinition::Albers(aea) => aea.forward(lon, lat),
        };
        match projected {
            Some((x, y)) if x.is_finite() && y.is_finite() => Ok((x, y)),
            _ => Err(ProjectionError::OutOfDomain { x: lon, y: lat, srs }),
        }
    }

    /// (x, y) in this system -> (lon, lat) degrees
    pub fn inverse(&self, srs: Srs, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let geographic = match self {
            SrsDefinition::Geographic => Some((x, y)),
            SrsDefinition::TransverseMercator(tm) => tm.inverse(x, y),
            SrsDefinition::Albers(aea) => aea.inverse(x, y),
        };
        match geographic {
            Some((lon, lat))
                if lon.is_finite() && lat.is_finite() && (-90.0..=90.0).contains(&lat) =>
            {
                Ok((lon, lat))
            }
            _ => Err(ProjectionError::OutOfDomain { x, y, srs }),
        }
    }
}

/// Look up a registered SRS.
pub fn lookup(srs: &Srs) -> Option<SrsDefinition> {
    let definition = match srs.epsg() {
        4326 | 4258 | 4269 => SrsDefinition::Geographic,
        3006 => SrsDefinition::TransverseMercator(TransverseMercator::new(
            GRS80_ELLIPSOID,
            15.0,
            0.9996,
            500_000.0,
            0.0,
        )),
        code @ 32601..=32660 => SrsDefinition::TransverseMercator(utm(code - 32600, false)),
        code @ 32701..=32760 => SrsDefinition::TransverseMercator(utm(code - 32700, true)),
        3310 => SrsDefinition::Albers(AlbersEqualArea::new(
            GRS80_ELLIPSOID,
            0.0,
            -120.0,
            34.0,
            40.5,
            0.0,
            -4_000_000.0,
        )),
        5070 => SrsDefinition::Albers(AlbersEqualArea::new(
            GRS80_ELLIPSOID,
            23.0,
            -96.0,
            29.5,
            45.5,
            0.0,
            0.0,
        )),
        _ => return None,
    };
    Some(definition)
}

fn utm(zone: u32, south: bool) -> TransverseMercator {
    let central_meridian = -183.0 + 6.0 * zone as f64;
    let false_northing = if south { 10_000_000.0 } else { 0.0 };
    TransverseMercator::new(WGS84_ELLIPSOID, central_meridian, 0.9996, 500_000.0, false_northing)
}

/// Transverse Mercator on the WGS84 ellipsoid with true scale along
/// `central_meridian`. Point scale grows away from that meridian and never
/// drops below 1, so plane distances never undercut ground distance.
pub fn local_transverse_mercator(central_meridian: f64) -> TransverseMercator {
    TransverseMercator::new(WGS84_ELLIPSOID, central_meridian, 1.0, 0.0, 0.0)
}
