//! Geometry capability behind the radius selection.
//!
//! Selection only ever talks to [`GeometryOps`]; swapping the built-in
//! projections for libproj (feature `proj`) does not touch it.

use geo::{Distance, Euclidean, Point};
use nbs_core::srs::Srs;

use crate::{error::ProjectionError, projection};

pub trait GeometryOps {
    /// Move `point` from `from` into `to`. Geographic points are (lon, lat).
    fn reproject(&self, point: Point<f64>, from: &Srs, to: &Srs) -> Result<Point<f64>, ProjectionError>;

    /// Move `point` from `from` into a transverse Mercator with true scale
    /// along `central_meridian` and no false origin.
    fn to_local_planar(
        &self,
        point: Point<f64>,
        from: &Srs,
        central_meridian: f64,
    ) -> Result<Point<f64>, ProjectionError>;

    /// True when `a` and `b` are at most `meters` apart. Both points must
    /// already be in the same planar system.
    fn within_distance(&self, a: Point<f64>, b: Point<f64>, meters: f64) -> bool {
        Euclidean::distance(a, b) <= meters
    }

    /// Whether distances in `srs` are metres on a plane.
    fn is_planar(&self, srs: &Srs) -> bool;
}

/// Pure-Rust implementation over the built-in projection registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGeometry;

impl GeometryOps for NativeGeometry {
    fn reproject(&self, point: Point<f64>, from: &Srs, to: &Srs) -> Result<Point<f64>, ProjectionError> {
        let source = projection::lookup(from).ok_or(ProjectionError::UnknownSrs(*from))?;
        let target = projection::lookup(to).ok_or(ProjectionError::UnknownSrs(*to))?;
        let (lon, lat) = source.inverse(*from, point.x(), point.y())?;
        let (x, y) = target.forward(*to, lon, lat)?;
        Ok(Point::new(x, y))
    }

    fn to_local_planar(
        &self,
        point: Point<f64>,
        from: &Srs,
        central_meridian: f64,
    ) -> Result<Point<f64>, ProjectionError> {
        let source = projection::lookup(from).ok_or(ProjectionError::UnknownSrs(*from))?;
        let (lon, lat) = source.inverse(*from, point.x(), point.y())?;
        match projection::local_transverse_mercator(central_meridian).forward(lon, lat) {
            Some((x, y)) if x.is_finite() && y.is_finite() => Ok(Point::new(x, y)),
            _ => Err(ProjectionError::OutsideLocalProjection {
                lon,
                lat,
                central_meridian,
            }),
        }
    }

    fn is_planar(&self, srs: &Srs) -> bool {
        projection::lookup(srs).is_some_and(|definition| definition.is_planar())
    }
}

/// libproj-backed implementation.
#[cfg(feature = "proj")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjGeometry;

#[cfg(feature = "proj")]
impl GeometryOps for ProjGeometry {
    fn reproject(&self, point: Point<f64>, from: &Srs, to: &Srs) -> Result<Point<f64>, ProjectionError> {
        use proj::Proj;

        let transformer = Proj::new_known_crs(&from.to_string(), &to.to_string(), None)
            .map_err(|e| ProjectionError::Backend(format!("{}", e)))?;

        // new_known_crs normalises EPSG:4326 to (lon, lat) order
        let (x, y) = transformer
            .convert((point.x(), point.y()))
            .map_err(|e| ProjectionError::Backend(format!("{}", e)))?;

        Ok(Point::new(x, y))
    }

    fn to_local_planar(
        &self,
        point: Point<f64>,
        from: &Srs,
        central_meridian: f64,
    ) -> Result<Point<f64>, ProjectionError> {
        use proj::Proj;

        let local = format!(
            "+proj=tmerc +lon_0={} +k=1 +x_0=0 +y_0=0 +ellps=WGS84 +units=m +type=crs",
            central_meridian
        );
        let transformer = Proj::new_known_crs(&from.to_string(), &local, None)
            .map_err(|e| ProjectionError::Backend(format!("{}", e)))?;
        let (x, y) = transformer
            .convert((point.x(), point.y()))
            .map_err(|e| ProjectionError::Backend(format!("{}", e)))?;
        Ok(Point::new(x, y))
    }

    fn is_planar(&self, srs: &Srs) -> bool {
        // libproj knows far more systems than the registry; only reject the
        // ones known to be geographic
        !matches!(
            projection::lookup(srs),
            Some(projection::SrsDefinition::Geographic)
        )
    }
}
