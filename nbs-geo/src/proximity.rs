//! Radius selection of candidate stations.
//!
//! A latitude/longitude box around the center over-selects at its corners,
//! so the decisive test is a circle in a planar projection whose Euclidean
//! distances track ground distance at the scale of the query.

use geo::Point;
use log::{debug, info, warn};
use nbs_core::{
    coordinate::Coordinate,
    error::PipelineError,
    srs::{Srs, WGS84},
    station::Station,
};
use std::collections::BTreeSet;

use crate::{error::ProjectionError, ops::GeometryOps};

/// Kilometres per degree of latitude at the equator, the shortest a
/// degree of latitude gets.
const KM_PER_DEGREE_LAT_MIN: f64 = 110.574;
/// Kilometres per degree of longitude on the equator
const KM_PER_DEGREE_LON_EQUATOR: f64 = 111.320;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorOptions {
    /// Reference system the center is stated in
    pub center_srs: Srs,
    /// Planar system the circle is drawn in; `None` uses a transverse
    /// Mercator with unit scale along the center's meridian
    pub target_srs: Option<Srs>,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        SelectorOptions {
            center_srs: WGS84,
            target_srs: None,
        }
    }
}

/// Select stations within `radius_km` of a WGS84 `center`.
pub fn select_within_radius<G: GeometryOps + ?Sized>(
    ops: &G,
    center: Coordinate,
    radius_km: f64,
    candidates: &[Station],
) -> Result<BTreeSet<String>, PipelineError> {
    select_within_radius_with(ops, center, radius_km, candidates, &SelectorOptions::default())
}

/// Select stations within `radius_km` of `center`.
///
/// Candidates without a reference system, or whose location cannot be
/// reprojected, are skipped. Fails with `NoCandidatesFound` when nothing is
/// left to test and `NoneWithinRadius` when the circle holds no station.
pub fn select_within_radius_with<G: GeometryOps + ?Sized>(
    ops: &G,
    center: Coordinate,
    radius_km: f64,
    candidates: &[Station],
    options: &SelectorOptions,
) -> Result<BTreeSet<String>, PipelineError> {
    // a planar center is easting/northing, so only a geographic one has ranges
    let planar_center = ops.is_planar(&options.center_srs);
    if planar_center {
        if !center.is_finite() {
            return Err(PipelineError::InvalidCoordinate {
                latitude: center.latitude,
                longitude: center.longitude,
            });
        }
    } else {
        center.validate()?;
    }
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(PipelineError::InvalidRadius(radius_km));
    }
    if candidates.is_empty() {
        return Err(PipelineError::NoCandidatesFound(
            "the candidate list is empty".to_string(),
        ));
    }

    let plane = match options.target_srs {
        Some(target) => {
            if !ops.is_planar(&target) {
                return Err(PipelineError::UnknownSrs {
                    srs: target.to_string(),
                    reason: "target is not a supported planar projection".to_string(),
                });
            }
            Plane::Registered(target)
        }
        None => {
            let longitude = if planar_center {
                ops.reproject(to_point(&center), &options.center_srs, &WGS84)
                    .map_err(|e| PipelineError::UnknownSrs {
                        srs: options.center_srs.to_string(),
                        reason: e.to_string(),
                    })?
                    .x()
            } else {
                center.longitude
            };
            Plane::Local {
                central_meridian: longitude,
            }
        }
    };

    let center_point = plane
        .project(ops, to_point(&center), &options.center_srs)
        .map_err(|e| PipelineError::UnknownSrs {
            srs: options.center_srs.to_string(),
            reason: e.to_string(),
        })?;
    let radius_m = radius_km * 1000.0;

    info!(
        "Testing {} candidates within {} km of {} in {}",
        candidates.len(),
        radius_km,
        center,
        plane
    );

    let mut reprojected = 0usize;
    let mut selected = BTreeSet::new();
    for station in candidates {
        let Some(srs) = station.srs else {
            warn!("Skipping {}: no spatial reference system", station.station_id);
            continue;
        };
        let point = match plane.project(ops, to_point(&station.location), &srs) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping {}: {}", station.station_id, e);
                continue;
            }
        };
        reprojected += 1;
        if ops.within_distance(center_point, point, radius_m) {
            debug!("Selected {}", station.station_id);
            selected.insert(station.station_id.clone());
        }
    }

    if reprojected == 0 {
        return Err(PipelineError::NoCandidatesFound(format!(
            "none of the {} candidates could be reprojected into {}",
            candidates.len(),
            plane
        )));
    }
    if selected.is_empty() {
        return Err(PipelineError::NoneWithinRadius {
            latitude: center.latitude,
            longitude: center.longitude,
            radius_km,
        });
    }

    info!("{} of {} candidates within radius", selected.len(), reprojected);
    Ok(selected)
}

/// The plane the circle is drawn in.
enum Plane {
    Registered(Srs),
    /// Transverse Mercator with unit scale on the query's meridian
    Local { central_meridian: f64 },
}

impl Plane {
    fn project<G: GeometryOps + ?Sized>(
        &self,
        ops: &G,
        point: Point<f64>,
        from: &Srs,
    ) -> Result<Point<f64>, ProjectionError> {
        match self {
            Plane::Registered(target) => ops.reproject(point, from, target),
            Plane::Local { central_meridian } => ops.to_local_planar(point, from, *central_meridian),
        }
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plane::Registered(srs) => write!(f, "{}", srs),
            Plane::Local { central_meridian } => {
                write!(f, "transverse Mercator on meridian {:.4}", central_meridian)
            }
        }
    }
}

fn to_point(coordinate: &Coordinate) -> Point<f64> {
    Point::new(coordinate.longitude, coordinate.latitude)
}

/// Latitude/longitude box that covers a circle of `radius_km`. This is the
/// coarse prefilter a station API applies with its `bbox` parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn around(center: &Coordinate, radius_km: f64) -> Self {
        let d_lat = radius_km / KM_PER_DEGREE_LAT_MIN;
        let min_latitude = (center.latitude - d_lat).max(-90.0);
        let max_latitude = (center.latitude + d_lat).min(90.0);
        // widest longitude span is needed at the most poleward edge
        let poleward = min_latitude.abs().max(max_latitude.abs());
        let km_per_degree_lon = KM_PER_DEGREE_LON_EQUATOR * poleward.to_radians().cos();
        let (min_longitude, max_longitude) = if km_per_degree_lon <= radius_km / 180.0 {
            (-180.0, 180.0)
        } else {
            let d_lon = radius_km / km_per_degree_lon;
            (
                (center.longitude - d_lon).max(-180.0),
                (center.longitude + d_lon).min(180.0),
            )
        };
        BoundingBox {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&coordinate.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&coordinate.longitude)
    }
}
