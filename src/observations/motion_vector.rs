//! # Motion vector
//!
//! Reduces a tracklet of any length to two representative observations (the *motion vector*)
//! and an astrometric RMS for each of them.
//!
//! ## Overview
//!
//! - Two observations are used as given, with zero RMS.
//! - Otherwise the representative times sit near the 17th and 83rd percentile of the ordered
//!   observation list.
//! - Arcs containing a space-based or unknown site use the raw observations at those
//!   percentile positions: an observer moving along the arc cannot be interpolated.
//! - A single-site arc shorter than three hours is reduced by one great-circle fit and both
//!   endpoints are synthesized from it.
//! - Longer or multi-site arcs are split into an initial and a final sub-arc (same site, under
//!   three hours, as long as possible). Each sub-arc is reduced on its own.
//!
//! ## See also
//! ------------
//! * [`GreatCircleFit`] – the underlying fit.
//! * [`crate::ranging`] – consumer of the motion vector.

use crate::{
    constants::{ArcSec, MJD, SHORT_ARC_SPAN},
    observations::{great_circle::GreatCircleFit, Observation},
    observers::SiteTable,
};

/// Two representative observations of a tracklet.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionVector {
    /// Start and end of the motion vector
    pub endpoints: [Observation; 2],
    /// Fit RMS attached to each endpoint (arcsec), zero for raw observations
    pub endpoint_rms: [ArcSec; 2],
    /// RMS of a great-circle fit over the whole tracklet (arcsec), zero for two observations
    pub rms: ArcSec,
}

impl MotionVector {
    /// Build the motion vector of a validated tracklet.
    ///
    /// Arguments
    /// ---------
    /// * `observations`: at least two observations in time order
    /// * `sites`: site table, used to detect arcs that cannot be interpolated
    ///
    /// Return
    /// ----------
    /// * The motion vector.
    pub fn from_observations(observations: &[Observation], sites: &SiteTable) -> Self {
        let n = observations.len();
        let default_pair = [observations[0].clone(), observations[n - 1].clone()];

        if n == 2 {
            return MotionVector {
                endpoints: default_pair,
                endpoint_rms: [0.0; 2],
                rms: 0.0,
            };
        }

        let whole = GreatCircleFit::fit(observations);
        let rms = whole.rms();

        let first_site = observations[0].site;
        let all_same_site = observations.iter().all(|o| o.site == first_site);
        let space_based = observations
            .iter()
            .any(|o| o.is_space_based() || !sites.site(o.site).is_ground_based());

        let position = (n - 1) as f64 / 6.0;
        let is = position.trunc() as usize;
        let fs = position.fract();

        if space_based {
            return MotionVector {
                endpoints: [observations[is].clone(), observations[n - 1 - is].clone()],
                endpoint_rms: [0.0; 2],
                rms,
            };
        }

        let t17 = observations[is].time + (observations[is + 1].time - observations[is].time) * fs;
        let ie = n - 1 - is;
        let t83 = observations[ie].time - (observations[ie].time - observations[ie - 1].time) * fs;

        if all_same_site && observations[n - 1].time - observations[0].time < SHORT_ARC_SPAN {
            let [mut start, mut end] = default_pair;
            synthesize(&mut start, &whole, t17);
            synthesize(&mut end, &whole, t83);
            return MotionVector {
                endpoints: [start, end],
                endpoint_rms: [rms; 2],
                rms,
            };
        }

        let (o1, o2) = split_arcs(observations);
        let uses_all = o2 == o1 + 1;
        let (start, start_rms) = reduce_arc(observations, 0, o1, uses_all, t17);
        let (end, end_rms) = reduce_arc(observations, o2, n - 1, uses_all, t83);

        MotionVector {
            endpoints: [start, end],
            endpoint_rms: [start_rms, end_rms],
            rms,
        }
    }

    /// Time between the two endpoints (days).
    #[inline]
    pub fn span(&self) -> f64 {
        self.endpoints[1].time - self.endpoints[0].time
    }
}

fn synthesize(obs: &mut Observation, fit: &GreatCircleFit, time: MJD) {
    let (ra, dec) = fit.position(time);
    obs.time = time;
    obs.ra = ra;
    obs.dec = dec;
}

/// Split off the initial arc `0..=o1` and the final arc `o2..n`.
///
/// Each arc holds a single site and spans less than three hours. Arcs are grown alternately
/// from both ends, favoring the one with the shorter next step, so that when they end up
/// covering every observation their spans are balanced.
fn split_arcs(observations: &[Observation]) -> (usize, usize) {
    let n = observations.len();
    let mut o1 = 0;
    let mut o2 = n - 1;
    let site1 = observations[o1].site;
    let site2 = observations[o2].site;
    let t1 = observations[o1].time;
    let t2 = observations[o2].time;

    loop {
        let dt1 = observations[o1 + 1].time - t1;
        if observations[o1 + 1].site != site1 || dt1 > SHORT_ARC_SPAN {
            // initial arc is done, only the final arc can still grow
            while o2 - 1 != o1
                && observations[o2 - 1].site == site2
                && t2 - observations[o2 - 1].time <= SHORT_ARC_SPAN
            {
                o2 -= 1;
            }
            break;
        }

        let dt2 = t2 - observations[o2 - 1].time;
        if observations[o2 - 1].site != site2 || dt2 > SHORT_ARC_SPAN {
            while o1 + 1 != o2
                && observations[o1 + 1].site == site1
                && observations[o1 + 1].time - t1 <= SHORT_ARC_SPAN
            {
                o1 += 1;
            }
            break;
        }

        if dt1 < dt2 {
            o1 += 1;
        } else {
            o2 -= 1;
        }
        if o2 <= o1 + 1 {
            break;
        }
    }
    (o1, o2)
}

/// Representative observation of the sub-arc `o1..=o2` for target time `target`.
///
/// When the two sub-arcs do not cover every observation, the target time is clipped to the end
/// of the sub-arc facing the discarded middle observations. When they do, the sub-arc is
/// evaluated at its own median time instead.
///
/// Return
/// ----------
/// * The observation (site and photometry of the sub-arc's first observation) and the fit RMS
///   of the sub-arc in arcseconds.
fn reduce_arc(
    observations: &[Observation],
    o1: usize,
    o2: usize,
    uses_all: bool,
    target: MJD,
) -> (Observation, ArcSec) {
    let initial = o1 == 0;

    if o1 == o2 {
        return (observations[o1].clone(), 0.0);
    }

    if o1 + 1 == o2 {
        if !uses_all {
            let (edge, dt) = if initial {
                (&observations[o2], observations[o2].time - target)
            } else {
                (&observations[o1], target - observations[o1].time)
            };
            if dt < 0.0 {
                return (edge.clone(), 0.0);
            }
        }

        let fit = GreatCircleFit::fit(&observations[o1..=o2]);
        let time = if uses_all {
            (observations[o1].time + observations[o2].time) * 0.5
        } else {
            target
        };
        let mut result = observations[o1].clone();
        synthesize(&mut result, &fit, time);
        return (result, 0.0);
    }

    let time = if uses_all {
        let is = (o1 + o2) / 2;
        if 2 * is < o1 + o2 {
            (observations[is].time + observations[is + 1].time) * 0.5
        } else {
            observations[is].time
        }
    } else {
        let edge = if initial { o2 } else { o1 };
        let edge_time = observations[edge].time;
        let dt = if initial {
            edge_time - target
        } else {
            target - edge_time
        };
        if dt < 0.0 {
            edge_time
        } else {
            target
        }
    };

    let fit = GreatCircleFit::fit(&observations[o1..=o2]);
    let mut result = observations[o1].clone();
    synthesize(&mut result, &fit, time);
    (result, fit.rms())
}
