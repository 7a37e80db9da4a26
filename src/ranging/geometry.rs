//! Geometry of the orbit search.
//!
//! [`TrackletGeometry`] holds everything derived once per tracklet: observer positions,
//! endpoint uncertainties and the set of offset lines of sight. [`DistanceGeometry`] holds the
//! vectors derived at one topocentric distance for one offset, together with the absolute
//! magnitude implied at that distance.

use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::{
    constants::{
        ArcSec, AstronomicalUnit, Radian, DEGENERATE_H, GAUSS_GRAV_SQUARED,
        OBS_ERR_CEILING_FACTOR, RADSEC,
    },
    observations::{motion_vector::MotionVector, Observation},
    observers::{earth_position::sun_position, observer_position::sun_to_observer, SiteTable},
    population::bins::h_bin,
    ref_system::{equatorial_to_ecliptic, radec_to_unit},
};

/// Angular uncertainty of one motion vector endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EndpointError {
    pub ra: Radian,
    pub dec: Radian,
}

/// Uncertainty of one axis of an endpoint.
///
/// Arguments
/// ---------
/// * `base`: configured default uncertainty of the site (radians)
/// * `reported`: per-observation uncertainty, `0` when absent
/// * `fit_rms`: RMS of the fit that produced the endpoint (arcsec)
/// * `no_threshold`: disable the ceiling on reported uncertainties
pub fn clip_error(base: Radian, reported: Radian, fit_rms: ArcSec, no_threshold: bool) -> Radian {
    if base == 0.0 {
        return 0.0;
    }
    let mut err = base;
    if reported > 0.0 {
        err = reported.max(base);
        if !no_threshold {
            err = err.min(OBS_ERR_CEILING_FACTOR * base);
        }
    }
    err.max(fit_rms * RADSEC)
}

/// Per-tracklet search geometry.
#[derive(Debug, Clone)]
pub struct TrackletGeometry {
    /// Sun → observer vectors at both endpoints (ecliptic, AU)
    pub sun_observer: [Vector3<f64>; 2],
    /// Line-of-sight unit vectors (ecliptic) of both endpoints, one pair per offset
    pub lines_of_sight: SmallVec<[[Vector3<f64>; 2]; 9]>,
    pub errors: [EndpointError; 2],
    /// Time between the endpoints (days)
    pub dt: f64,
    /// Mean apparent V magnitude of the tracklet
    pub vmag: f64,
}

impl TrackletGeometry {
    /// Set up the geometry of a motion vector.
    ///
    /// Arguments
    /// ---------
    /// * `mv`: motion vector of the tracklet
    /// * `sites`: site table, with configured uncertainty overrides
    /// * `default_err`: global default uncertainty (radians)
    /// * `no_threshold`: disable the ceiling on reported uncertainties
    /// * `vmag`: mean apparent V magnitude
    ///
    /// Return
    /// ----------
    /// * The geometry. When both endpoints have zero uncertainty a single line of sight pair is
    ///   kept, otherwise the nine combinations of a half-uncertainty offset (−, 0, +) in RA and
    ///   Dec, the second endpoint being offset the opposite way.
    pub fn new(
        mv: &MotionVector,
        sites: &SiteTable,
        default_err: Radian,
        no_threshold: bool,
        vmag: f64,
    ) -> Self {
        let errors: [EndpointError; 2] = std::array::from_fn(|k| {
            let obs = &mv.endpoints[k];
            let base = sites.site(obs.site()).default_error(default_err);
            EndpointError {
                ra: clip_error(base, obs.error_ra, mv.endpoint_rms[k], no_threshold),
                dec: clip_error(base, obs.error_dec, mv.endpoint_rms[k], no_threshold),
            }
        });

        let sun_observer =
            std::array::from_fn(|k| sun_to_observer(&mv.endpoints[k], sites.site(mv.endpoints[k].site())));

        let no_error = errors.iter().all(|e| e.ra == 0.0 && e.dec == 0.0);
        let lines_of_sight = if no_error {
            std::iter::once(line_of_sight_pair(&mv.endpoints, &errors, 0.0, 0.0)).collect()
        } else {
            itertools::iproduct!([-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0])
                .map(|(rx, dx)| line_of_sight_pair(&mv.endpoints, &errors, rx, dx))
                .collect()
        };

        TrackletGeometry {
            sun_observer,
            lines_of_sight,
            errors,
            dt: mv.span(),
            vmag,
        }
    }

    /// `true` when both endpoints have zero uncertainty.
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.lines_of_sight.len() == 1
    }
}

fn line_of_sight_pair(
    endpoints: &[Observation; 2],
    errors: &[EndpointError; 2],
    rx: f64,
    dx: f64,
) -> [Vector3<f64>; 2] {
    std::array::from_fn(|k| {
        let sign = if k == 0 { 1.0 } else { -1.0 };
        let obs = &endpoints[k];
        let dec = obs.dec + sign * dx * errors[k].dec * 0.5;
        let ra = obs.ra + sign * rx * errors[k].ra * 0.5 * dec.cos();
        equatorial_to_ecliptic(sun_position(obs.time).obliquity) * radec_to_unit(ra, dec)
    })
}

/// Vectors of the search at one topocentric distance of the first endpoint.
#[derive(Debug, Clone)]
pub struct DistanceGeometry {
    /// Sun → object at the first epoch
    pub sun_object0: Vector3<f64>,
    pub sun_object0_norm: AstronomicalUnit,
    /// Second observer → object at the first epoch
    pub observer1_object0: Vector3<f64>,
    pub observer1_object0_norm: AstronomicalUnit,
    /// Line of sight of the second endpoint
    pub unit1: Vector3<f64>,
    /// Angle between `observer1_object0` and `unit1`
    pub tz: Radian,
    /// Absolute magnitude of the object at this distance
    pub h: f64,
    pub h_bin: usize,
}

impl DistanceGeometry {
    /// Place the object at `distance` along the first line of sight of `pair`.
    pub fn new(
        geometry: &TrackletGeometry,
        pair: &[Vector3<f64>; 2],
        distance: AstronomicalUnit,
    ) -> Self {
        let observer_object0 = pair[0] * distance;
        let sun_object0 = geometry.sun_observer[0] + observer_object0;
        let sun_object0_norm = sun_object0.norm();
        let observer1_object0 = sun_object0 - geometry.sun_observer[1];
        let observer1_object0_norm = observer1_object0.norm();

        let h = absolute_magnitude(
            geometry.vmag,
            &observer_object0,
            distance,
            &sun_object0,
            sun_object0_norm,
        );

        let th = (observer1_object0.dot(&pair[1]) / observer1_object0_norm).clamp(-1.0, 1.0);

        DistanceGeometry {
            sun_object0,
            sun_object0_norm,
            observer1_object0,
            observer1_object0_norm,
            unit1: pair[1],
            tz: th.acos(),
            h,
            h_bin: h_bin(h),
        }
    }

    /// Range of the free angle for which a bound orbit exists at this distance.
    ///
    /// Return
    /// ----------
    /// * `(ang1, ang2)`, or `None` when the consistency condition has no solution (including
    ///   non-finite intermediate values).
    pub fn angle_range(&self, dt: f64) -> Option<(Radian, Radian)> {
        let th = self.tz.cos();
        let r = self.observer1_object0_norm;
        let rsq = r * r;

        let aa = 1.0 / (dt * dt);
        let bb = -2.0 * r * th * aa;
        let cc = rsq * aa - 2.0 * GAUSS_GRAV_SQUARED / self.sun_object0_norm;
        let dsc = bb * bb - 4.0 * aa * cc;
        if !(dsc > 0.0) {
            return None;
        }

        let sd = dsc.sqrt();
        let sin_tz = self.tz.sin();
        let angle = |sd1: f64| {
            let d2 = (-bb + sd1) * 0.5 / aa;
            let nns = d2 * d2 + rsq - 2.0 * d2 * r * th;
            let nn = nns.sqrt();
            let ca = (nns + rsq - d2 * d2) / (2.0 * nn * r);
            let sa = d2 * sin_tz / nn;
            2.0 * sa.atan2(1.0 + ca)
        };
        Some((angle(-sd), angle(sd)))
    }
}

/// Absolute magnitude of an object seen at `vmag`, from its phase angle and distances.
fn absolute_magnitude(
    vmag: f64,
    observer_object: &Vector3<f64>,
    distance: AstronomicalUnit,
    sun_object: &Vector3<f64>,
    sun_object_norm: AstronomicalUnit,
) -> f64 {
    let rdelta = distance * sun_object_norm;
    let cospsi = observer_object.dot(sun_object) / rdelta;
    // also catches a NaN phase from a zero-length vector
    if !(cospsi > -0.9999) {
        return DEGENERATE_H;
    }
    let tanhalf = (1.0 - cospsi * cospsi).sqrt() / (1.0 + cospsi);
    let phi1 = (-3.33 * tanhalf.powf(0.63)).exp();
    let phi2 = (-1.87 * tanhalf.powf(1.22)).exp();
    vmag - 5.0 * rdelta.log10() + 2.5 * (0.85 * phi1 + 0.15 * phi2).log10()
}
