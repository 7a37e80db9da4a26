use crate::constants::{Radian, DPI, MJD, T2000};

/// Ratio of sidereal day to solar day
const SIDEREAL_RATE: f64 = 1.00273790934;

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians for a Modified Julian Date.
///
/// GMST at 0h UT is given by the IAU 1982 cubic polynomial, then the rotation of the Earth
/// during the fraction of the day is added at the sidereal rate. Observation times are UTC;
/// the UT1 − UTC difference (< 0.9 s) is below what the parallax correction can resolve.
///
/// Arguments
/// ---------
/// * `mjd`: Modified Julian Date
///
/// Return
/// ----------
/// * GMST angle in radians, normalized to `[0, 2π)`.
pub fn gmst(mjd: MJD) -> Radian {
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let day = mjd.floor();
    let t = (day - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;
    let rotation = (mjd - day) * DPI * SIDEREAL_RATE;

    (gmst0 + rotation).rem_euclid(DPI)
}

/// Local sidereal time of a site, in radians.
///
/// Arguments
/// ---------
/// * `mjd`: Modified Julian Date of the observation
/// * `longitude`: east longitude of the site in fractional turns (`[0, 1)`)
///
/// Return
/// ----------
/// * Local sidereal time normalized to `[0, 2π)`.
pub fn local_sidereal_time(mjd: MJD, longitude: f64) -> Radian {
    (gmst(mjd) + longitude * DPI).rem_euclid(DPI)
}
