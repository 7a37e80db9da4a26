//! # Reference frames
//!
//! Minimal set of frame operations needed by the scoring engine: unit vectors from
//! equatorial angles and back, and the rotation from the equatorial frame of date to the
//! ecliptic frame of date.
//!
//! ## See also
//! * [`crate::observers::earth_position::sun_position`] – provides the obliquity of date.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI};

/// Rotation matrix taking equatorial coordinates to ecliptic coordinates.
///
/// Arguments
/// ---------
/// * `obliquity`: obliquity of the ecliptic in radians
///
/// Return
/// ----------
/// * A rotation of `-obliquity` around the x-axis (the equinox direction).
pub fn equatorial_to_ecliptic(obliquity: Radian) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), -obliquity).into()
}

/// Unit vector pointing at the given right ascension / declination.
#[inline]
pub fn radec_to_unit(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sin_ra, cos_ra) = ra.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    Vector3::new(cos_ra * cos_dec, sin_ra * cos_dec, sin_dec)
}

/// Spherical angles of a unit vector.
///
/// Return
/// ----------
/// * `(ra, dec)` with `ra` in `[0, 2π)` and `dec` in `[-π/2, π/2]`. The z-component is clamped
///   into `[-1, 1]` before the arcsine so that rounding on a rotated unit vector cannot
///   produce NaN.
#[inline]
pub fn unit_to_radec(v: &Vector3<f64>) -> (Radian, Radian) {
    let ra = v.y.atan2(v.x).rem_euclid(DPI);
    let dec = v.z.clamp(-1.0, 1.0).asin();
    (ra, dec)
}
