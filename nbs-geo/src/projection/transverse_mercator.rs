use super::Ellipsoid;

/// Transverse Mercator with latitude of origin on the equator, evaluated
/// with the Krüger n-series to fourth order (sub-millimetre within a
/// UTM-sized zone).
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    central_meridian: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
    /// Rectifying radius
    a_hat: f64,
    /// Geodetic -> conformal latitude coefficients
    conformal: [f64; 4],
    /// Conformal -> geodetic latitude coefficients
    geodetic: [f64; 4],
    beta: [f64; 4],
    delta: [f64; 4],
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        central_meridian: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let f = ellipsoid.flattening;
        let n = f / (2.0 - f);
        let (n2, n3, n4) = (n * n, n.powi(3), n.powi(4));
        let e2 = ellipsoid.e2();
        let (e4, e6, e8) = (e2 * e2, e2.powi(3), e2.powi(4));

        TransverseMercator {
            central_meridian,
            scale,
            false_easting,
            false_northing,
            a_hat: ellipsoid.semi_major / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0),
            conformal: [
                e2,
                (5.0 * e4 - e6) / 6.0,
                (104.0 * e6 - 45.0 * e8) / 120.0,
                1237.0 * e8 / 1260.0,
            ],
            geodetic: [
                e2 + e4 + e6 + e8,
                -(7.0 * e4 + 17.0 * e6 + 30.0 * e8) / 6.0,
                (224.0 * e6 + 889.0 * e8) / 120.0,
                -(4279.0 * e8) / 1260.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0,
                61.0 * n3 / 240.0 - 103.0 * n4 / 140.0,
                49561.0 * n4 / 161280.0,
            ],
            delta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0,
                n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0,
                17.0 * n3 / 480.0 - 37.0 * n4 / 840.0,
                4397.0 * n4 / 161280.0,
            ],
        }
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// (lon, lat) degrees -> (easting, northing) metres. `None` when the
    /// point is a quarter turn or more away from the central meridian.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let d_lambda = wrap_radians((lon - self.central_meridian).to_radians());
        if d_lambda.abs() >= std::f64::consts::FRAC_PI_2 {
            return None;
        }
        let phi = lat.to_radians();
        let s2 = phi.sin().powi(2);
        let [a, b, c, d] = self.conformal;
        let phi_star = phi - phi.sin() * phi.cos() * (a + s2 * (b + s2 * (c + s2 * d)));

        let xi_p = (phi_star.tan() / d_lambda.cos()).atan();
        let eta_p = (phi_star.cos() * d_lambda.sin()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (i, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (i + 1) as f64;
            xi += beta * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += beta * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let k0a = self.scale * self.a_hat;
        Some((k0a * eta + self.false_easting, k0a * xi + self.false_northing))
    }

    /// (easting, northing) metres -> (lon, lat) degrees
    pub fn inverse(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let k0a = self.scale * self.a_hat;
        let xi = (northing - self.false_northing) / k0a;
        let eta = (easting - self.false_easting) / k0a;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (i, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (i + 1) as f64;
            xi_p -= delta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= delta * (k * xi).cos() * (k * eta).sinh();
        }

        let sin_phi_star = xi_p.sin() / eta_p.cosh();
        if !(-1.0..=1.0).contains(&sin_phi_star) {
            return None;
        }
        let phi_star = sin_phi_star.asin();
        let d_lambda = eta_p.sinh().atan2(xi_p.cos());

        let s2 = phi_star.sin().powi(2);
        let [a, b, c, d] = self.geodetic;
        let phi =
            phi_star + phi_star.sin() * phi_star.cos() * (a + s2 * (b + s2 * (c + s2 * d)));

        let lon = self.central_meridian + d_lambda.to_degrees();
        Some((wrap_degrees(lon), phi.to_degrees()))
    }
}

fn wrap_radians(angle: f64) -> f64 {
    use std::f64::consts::PI;
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
