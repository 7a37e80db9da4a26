//! # Great-circle fit
//!
//! Fits an arc of observations with uniform motion along a single great circle.
//!
//! ## Overview
//!
//! 1. Observations are turned into unit vectors and the frame is rotated so that the great
//!    circle through the first and last observation becomes the equator.
//! 2. In the rotated frame, longitude and latitude are fitted independently as linear functions
//!    of time (exact two-point solve, or ordinary least squares for three points or more).
//! 3. Positions and residuals are rotated back into the original frame.
//!
//! Working along the rotated equator keeps the fit well-conditioned for arcs crossing the pole
//! or the RA = 0 meridian.
//!
//! ## See also
//! ------------
//! * [`crate::observations::motion_vector`] – main consumer of the fit.

use nalgebra::{Matrix3, Vector3};
use smallvec::SmallVec;

use crate::{
    constants::{ArcSec, Radian, DPI, GREAT_CIRCLE_TOLERANCE, MJD, RADSEC},
    observations::Observation,
    ref_system::{radec_to_unit, unit_to_radec},
};

use std::f64::consts::PI;

/// One observation expressed in the rotated frame, relative to the fit origin.
#[derive(Debug, Clone, Copy)]
struct ArcSample {
    dt: f64,
    lon: Radian,
    lat: Radian,
}

/// Linear motion along a great circle.
#[derive(Debug, Clone)]
pub struct GreatCircleFit {
    /// rotated frame → original frame
    derotation: Matrix3<f64>,
    /// rotated longitude of the first observation
    lon0: Radian,
    t0: MJD,
    lon_intercept: Radian,
    lon_rate: f64,
    lat_intercept: Radian,
    lat_rate: f64,
    samples: SmallVec<[ArcSample; 6]>,
}

/// Rotation bringing the pole `n` onto the z-axis, about an axis lying in the xy-plane.
fn pole_to_z(n: &Vector3<f64>) -> Matrix3<f64> {
    let nmag = n.norm();
    let nxy = n.x.hypot(n.y);

    let (gx, gy) = if nxy > 0.0 {
        (n.y / nxy, -n.x / nxy)
    } else {
        (1.0, 0.0)
    };
    let sina = nxy / nmag;
    let cosa = n.z / nmag;
    let vers = 1.0 - cosa;

    Matrix3::new(
        cosa + vers * gx * gx,
        vers * gx * gy,
        sina * gy,
        vers * gx * gy,
        cosa + vers * gy * gy,
        -sina * gx,
        -sina * gy,
        sina * gx,
        cosa,
    )
}

impl GreatCircleFit {
    /// Fit the observations with uniform motion along a great circle.
    ///
    /// Arguments
    /// ---------
    /// * `observations`: at least two observations, in time order
    ///
    /// Return
    /// ----------
    /// * The fitted motion.
    ///
    /// Panics
    /// ----------
    /// * if fewer than two observations are given,
    /// * if the rotated first or last observation lies more than one arcsecond off the rotated
    ///   equator, or is not finite. This can only happen through a broken rotation or an
    ///   unvalidated arc and is not recoverable.
    pub fn fit(observations: &[Observation]) -> Self {
        assert!(
            observations.len() >= 2,
            "great-circle fit needs at least two observations, got {}",
            observations.len()
        );

        let cart: SmallVec<[Vector3<f64>; 6]> = observations
            .iter()
            .map(|o| radec_to_unit(o.ra, o.dec))
            .collect();
        let first = cart[0];
        let last = cart[cart.len() - 1];

        // A stationary arc has no defined circle: any circle through the point will do.
        let mut pole = first.cross(&last);
        if pole.norm_squared() == 0.0 {
            pole = first.cross(&Vector3::z());
            if pole.norm_squared() == 0.0 {
                pole = first.cross(&Vector3::x());
            }
        }

        let rotation = pole_to_z(&pole);
        let rotated: SmallVec<[Vector3<f64>; 6]> = cart.iter().map(|v| rotation * v).collect();

        check_anchors(&rotated[0], &rotated[rotated.len() - 1]);

        let lon0 = unit_to_radec(&rotated[0]).0;
        let t0 = observations[0].time;
        let samples: SmallVec<[ArcSample; 6]> = rotated
            .iter()
            .zip(observations)
            .map(|(v, o)| {
                let (lon, lat) = unit_to_radec(v);
                ArcSample {
                    dt: o.time - t0,
                    lon: (lon + 3.0 * PI - lon0).rem_euclid(DPI) - PI,
                    lat,
                }
            })
            .collect();

        let (lon_intercept, lon_rate, lat_intercept, lat_rate) = if samples.len() == 2 {
            two_point_solve(&samples[0], &samples[1])
        } else {
            least_squares(&samples)
        };

        GreatCircleFit {
            derotation: rotation.transpose(),
            lon0,
            t0,
            lon_intercept,
            lon_rate,
            lat_intercept,
            lat_rate,
            samples,
        }
    }

    /// Position on the fitted circle at time `t`.
    ///
    /// Return
    /// ----------
    /// * `(ra, dec)` in radians, `ra` in `[0, 2π)`.
    pub fn position(&self, t: MJD) -> (Radian, Radian) {
        let dt = t - self.t0;
        self.derotate(
            self.lon_intercept + self.lon_rate * dt,
            self.lat_intercept + self.lat_rate * dt,
        )
    }

    fn derotate(&self, lon: Radian, lat: Radian) -> (Radian, Radian) {
        let v = self.derotation * radec_to_unit(lon + self.lon0, lat);
        unit_to_radec(&v)
    }

    /// Residuals of the fitted observations, in arcseconds.
    ///
    /// Both the observed and the computed positions are rotated back into the original frame
    /// so that rounding in the rotation affects both sides alike.
    ///
    /// Return
    /// ----------
    /// * One `(ΔRA·cos δ, ΔDec)` pair per observation, observed minus computed.
    pub fn residuals(&self) -> SmallVec<[(ArcSec, ArcSec); 6]> {
        self.samples
            .iter()
            .map(|s| {
                let (ra_o, dec_o) = self.derotate(s.lon, s.lat);
                let (ra_c, dec_c) = self.derotate(
                    self.lon_intercept + self.lon_rate * s.dt,
                    self.lat_intercept + self.lat_rate * s.dt,
                );
                let dra = (ra_o - ra_c + PI).rem_euclid(DPI) - PI;
                (dra * dec_c.cos() / RADSEC, (dec_o - dec_c) / RADSEC)
            })
            .collect()
    }

    /// Root mean square of the residuals, in arcseconds.
    pub fn rms(&self) -> ArcSec {
        let res = self.residuals();
        let sum: f64 = res.iter().map(|(r, d)| r * r + d * d).sum();
        (sum / res.len() as f64).sqrt()
    }
}

/// Panics unless both rotated anchor points lie on the rotated equator.
///
/// A NaN coordinate fails the check.
fn check_anchors(first: &Vector3<f64>, last: &Vector3<f64>) {
    let on_equator = |z: f64| z.abs() <= GREAT_CIRCLE_TOLERANCE;
    if !(on_equator(first.z) && on_equator(last.z)) {
        panic!(
            "great-circle rotation failed: anchor points at z = {:e}, {:e} (tolerance {:e})",
            first.z, last.z, GREAT_CIRCLE_TOLERANCE
        );
    }
}

fn two_point_solve(a: &ArcSample, b: &ArcSample) -> (f64, f64, f64, f64) {
    let span = b.dt - a.dt;
    if span == 0.0 {
        return ((a.lon + b.lon) * 0.5, 0.0, 0.0, 0.0);
    }
    (0.0, b.lon / span, 0.0, 0.0)
}

fn least_squares(samples: &[ArcSample]) -> (f64, f64, f64, f64) {
    let n = samples.len() as f64;
    let (mut st, mut slon, mut slat, mut stt, mut stlon, mut stlat) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for s in samples {
        st += s.dt;
        slon += s.lon;
        slat += s.lat;
        stt += s.dt * s.dt;
        stlon += s.dt * s.lon;
        stlat += s.dt * s.lat;
    }

    let det = n * stt - st * st;
    if det == 0.0 {
        return (slon / n, 0.0, slat / n, 0.0);
    }
    let inv = 1.0 / det;
    (
        inv * (slon * stt - stlon * st),
        inv * (n * stlon - slon * st),
        inv * (slat * stt - stlat * st),
        inv * (n * stlat - slat * st),
    )
}

#[cfg(test)]
mod great_circle_test {
    use super::*;
    use crate::constants::RADEG;
    use approx::assert_abs_diff_eq;

    fn obs(time: f64, ra: f64, dec: f64) -> Observation {
        Observation::new(500, time, ra, dec).unwrap()
    }

    /// Points moving uniformly along the great circle through `a` with pole `pole`.
    fn arc(times: &[f64], rate: f64) -> Vec<Observation> {
        let pole = Vector3::new(0.3, -0.4, 0.866).normalize();
        let a = pole.cross(&Vector3::z()).normalize();
        let b = pole.cross(&a);
        times
            .iter()
            .map(|&t| {
                let ang = rate * (t - times[0]);
                let v = a * ang.cos() + b * ang.sin();
                let (ra, dec) = unit_to_radec(&v);
                obs(t, ra, dec)
            })
            .collect()
    }

    #[test]
    fn test_anchor_check() {
        check_anchors(&Vector3::x(), &Vector3::new(0.0, 1.0, 0.5 * GREAT_CIRCLE_TOLERANCE));
    }

    #[test]
    #[should_panic(expected = "great-circle rotation failed")]
    fn test_anchor_off_the_equator_is_fatal() {
        check_anchors(&Vector3::x(), &Vector3::new(0.0, 1.0, 1e-3).normalize());
    }

    #[test]
    #[should_panic(expected = "great-circle rotation failed")]
    fn test_non_finite_arc_is_fatal() {
        GreatCircleFit::fit(&[obs(60000.0, f64::NAN, 0.3), obs(60000.05, 1.01, 0.305)]);
    }

    #[test]
    fn test_two_point_fit_passes_through_both() {
        let o = vec![obs(60000.0, 1.0, 0.3), obs(60000.05, 1.01, 0.305)];
        let fit = GreatCircleFit::fit(&o);

        for ob in &o {
            let (ra, dec) = fit.position(ob.time);
            assert_abs_diff_eq!(ra, ob.ra, epsilon = 1e-12);
            assert_abs_diff_eq!(dec, ob.dec, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(fit.rms(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_motion_fits_exactly() {
        let o = arc(&[60000.0, 60000.01, 60000.02, 60000.04, 60000.05], 2.0 * RADEG);
        let fit = GreatCircleFit::fit(&o);
        assert_abs_diff_eq!(fit.rms(), 0.0, epsilon = 1e-6);

        // Interpolation halfway through
        let mid = arc(&[60000.0, 60000.03], 2.0 * RADEG);
        let (ra, dec) = fit.position(60000.03);
        assert_abs_diff_eq!(ra, mid[1].ra, epsilon = 1e-10);
        assert_abs_diff_eq!(dec, mid[1].dec, epsilon = 1e-10);
    }

    #[test]
    fn test_residuals_pick_up_an_outlier() {
        let mut o = arc(&[60000.0, 60000.01, 60000.02, 60000.03], 2.0 * RADEG);
        o[1].dec += 2.0 * RADSEC;
        let fit = GreatCircleFit::fit(&o);

        let res = fit.residuals();
        assert_eq!(res.len(), 4);
        let worst = res
            .iter()
            .map(|(r, d)| r.hypot(*d))
            .fold(0.0_f64, f64::max);
        assert!(worst > 0.5 && worst < 2.0, "worst residual {worst}");
        assert!(fit.rms() > 0.3);
    }

    #[test]
    fn test_fit_across_zero_ra() {
        let o = vec![
            obs(60000.0, DPI - 0.001, 0.01),
            obs(60000.01, DPI - 0.0002, 0.011),
            obs(60000.02, 0.0006, 0.012),
        ];
        let fit = GreatCircleFit::fit(&o);
        assert!(fit.rms() < 1.0);
        let (ra, _) = fit.position(60000.01);
        assert!(ra > DPI - 0.001 || ra < 0.001);
    }

    #[test]
    fn test_equatorial_and_stationary_arcs_stay_finite() {
        let along_equator = vec![obs(60000.0, 1.0, 0.0), obs(60000.1, 1.1, 0.0)];
        let fit = GreatCircleFit::fit(&along_equator);
        let (ra, dec) = fit.position(60000.05);
        assert_abs_diff_eq!(ra, 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(dec, 0.0, epsilon = 1e-12);

        let stationary = vec![
            obs(60000.0, 2.0, 0.4),
            obs(60000.01, 2.0 + 1e-6, 0.4),
            obs(60000.02, 2.0, 0.4),
        ];
        let fit = GreatCircleFit::fit(&stationary);
        let (ra, dec) = fit.position(60000.01);
        assert!(ra.is_finite() && dec.is_finite());
        assert!(fit.rms().is_finite());
    }
}
