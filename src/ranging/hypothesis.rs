//! Orbit implied by one (distance, angle) hypothesis.

use crate::{
    constants::{Degree, Radian, INV_GAUSS_GRAV, MAX_ECCENTRICITY, RADEG},
    ranging::geometry::DistanceGeometry,
};

use std::f64::consts::PI;

/// Orbit elements needed for classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSample {
    /// Perihelion distance (AU)
    pub q: f64,
    pub e: f64,
    pub i: Degree,
}

/// Solve the orbit of the object for the free angle `an`.
///
/// The angle fixes the distance of the object at the second epoch; the velocity follows from
/// the displacement between the two epochs, in units where G·M☉ = 1.
///
/// Arguments
/// ---------
/// * `dist`: vectors at the current distance
/// * `an`: free angle, inside the range returned by [`DistanceGeometry::angle_range`]
/// * `dt`: time between the endpoints (days)
///
/// Return
/// ----------
/// * The orbit, or `None` when it is numerically unstable (`a` beyond about 100 AU, or
///   `e > 0.99`).
pub fn solve_orbit(dist: &DistanceGeometry, an: Radian, dt: f64) -> Option<OrbitSample> {
    let d2 = dist.observer1_object0_norm * an.sin() / (PI - an - dist.tz).sin();
    let v = (dist.unit1 * d2 - dist.observer1_object0) * (INV_GAUSS_GRAV / dt);

    let h = dist.sun_object0.cross(&v);
    let hsq = h.norm_squared();
    let hm = hsq.sqrt();

    let r = dist.sun_object0_norm;
    let temp = 2.0 - r * v.norm_squared();
    if r > temp * 100.0 {
        return None;
    }
    let a = r / temp;

    let e = (1.0 - hsq * temp / r).max(0.0).sqrt();
    if e > MAX_ECCENTRICITY {
        return None;
    }

    // h.z can exceed |h| by rounding for planar orbits
    let i = if h.z >= hm {
        0.0
    } else {
        (h.z / hm).clamp(-1.0, 1.0).acos() / RADEG
    };

    Some(OrbitSample {
        q: a * (1.0 - e),
        e,
        i,
    })
}
