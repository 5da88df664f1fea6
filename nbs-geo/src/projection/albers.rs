use super::Ellipsoid;

const MAX_ITERATIONS: usize = 15;
const TOLERANCE: f64 = 1e-12;

/// Albers equal-area conic on the ellipsoid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersEqualArea {
    semi_major: f64,
    e: f64,
    e2: f64,
    n: f64,
    c: f64,
    rho0: f64,
    central_meridian: f64,
    false_easting: f64,
    false_northing: f64,
}

impl AlbersEqualArea {
    pub fn new(
        ellipsoid: Ellipsoid,
        latitude_of_origin: f64,
        central_meridian: f64,
        standard_parallel_1: f64,
        standard_parallel_2: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e2 = ellipsoid.e2();
        let e = e2.sqrt();
        let phi1 = standard_parallel_1.to_radians();
        let phi2 = standard_parallel_2.to_radians();
        let m1 = m(phi1, e2);
        let m2 = m(phi2, e2);
        let q0 = q(latitude_of_origin.to_radians().sin(), e, e2);
        let q1 = q(phi1.sin(), e, e2);
        let q2 = q(phi2.sin(), e, e2);
        let n = if (phi1 - phi2).abs() < f64::EPSILON {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = ellipsoid.semi_major * (c - n * q0).max(0.0).sqrt() / n;

        AlbersEqualArea {
            semi_major: ellipsoid.semi_major,
            e,
            e2,
            n,
            c,
            rho0,
            central_meridian,
            false_easting,
            false_northing,
        }
    }

    /// (lon, lat) degrees -> (x, y) metres
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let q = q(lat.to_radians().sin(), self.e, self.e2);
        let rho = self.semi_major * (self.c - self.n * q).max(0.0).sqrt() / self.n;
        let d_lambda = ((lon - self.central_meridian) + 180.0).rem_euclid(360.0) - 180.0;
        let theta = self.n * d_lambda.to_radians();
        Some((
            self.false_easting + rho * theta.sin(),
            self.false_northing + self.rho0 - rho * theta.cos(),
        ))
    }

    /// (x, y) metres -> (lon, lat) degrees
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let sign = self.n.signum();
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let rho = sign * dx.hypot(dy);
        let theta = (sign * dx).atan2(sign * dy);
        let q = (self.c - (rho * self.n / self.semi_major).powi(2)) / self.n;
        let phi = self.latitude_from_q(q)?;
        let lon = self.central_meridian + (theta / self.n).to_degrees();
        Some(((lon + 180.0).rem_euclid(360.0) - 180.0, phi.to_degrees()))
    }

    fn latitude_from_q(&self, q: f64) -> Option<f64> {
        let half = q / 2.0;
        if !(-1.0..=1.0).contains(&half) {
            return None;
        }
        let (e, e2) = (self.e, self.e2);
        let mut phi = half.asin();
        for _ in 0..MAX_ITERATIONS {
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            if cos_phi.abs() < TOLERANCE {
                return Some(phi);
            }
            let one_minus = 1.0 - e2 * sin_phi * sin_phi;
            let step = one_minus * one_minus / (2.0 * cos_phi)
                * (q / (1.0 - e2) - sin_phi / one_minus
                    + 1.0 / (2.0 * e) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln());
            phi += step;
            if step.abs() < TOLERANCE {
                return Some(phi);
            }
        }
        Some(phi)
    }
}

fn m(phi: f64, e2: f64) -> f64 {
    let sin_phi = phi.sin();
    phi.cos() / (1.0 - e2 * sin_phi * sin_phi).sqrt()
}

fn q(sin_phi: f64, e: f64, e2: f64) -> f64 {
    (1.0 - e2)
        * (sin_phi / (1.0 - e2 * sin_phi * sin_phi)
            - 1.0 / (2.0 * e) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln())
}
