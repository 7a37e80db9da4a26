use nalgebra::Vector3;

use crate::constants::{Radian, MJD, RADEG, T2000};

/// Geocentric position of the Sun at some epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Earth → Sun vector in the equatorial frame of date (AU)
    pub geocentric: Vector3<f64>,
    /// Mean obliquity of the ecliptic of date
    pub obliquity: Radian,
}

/// Approximate geocentric position of the Sun.
///
/// Low-precision solar coordinates from the Astronomical Almanac (accurate to about 0.01°
/// between 1950 and 2050), which is far below the angular resolution the orbit search needs.
///
/// Arguments
/// ---------
/// * `mjd`: Modified Julian Date
///
/// Return
/// ----------
/// * The Earth → Sun vector in the equatorial frame of date, together with the obliquity used
///   to express it.
pub fn sun_position(mjd: MJD) -> SunPosition {
    let d = mjd - T2000;

    // mean anomaly and mean longitude
    let g = (357.529 + 0.98560028 * d) * RADEG;
    let q = (280.459 + 0.98564736 * d) * RADEG;

    let longitude = q + (1.915 * g.sin() + 0.020 * (2.0 * g).sin()) * RADEG;
    let distance = 1.00014 - 0.01671 * g.cos() - 0.00014 * (2.0 * g).cos();
    let obliquity = (23.439 - 0.00000036 * d) * RADEG;

    let (sin_l, cos_l) = longitude.sin_cos();
    let (sin_e, cos_e) = obliquity.sin_cos();
    let y = distance * sin_l;

    SunPosition {
        geocentric: Vector3::new(distance * cos_l, y * cos_e, y * sin_e),
        obliquity,
    }
}
