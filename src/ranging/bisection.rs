//! Adaptive bisection over distance and angle.
//!
//! Both searches explore an interval by evaluating one interior point and splitting the
//! interval there. A branch keeps being refined while its evaluation tags new bins or while it
//! is still wider than a fixed step; once it stops producing, it gets one more level of grace
//! (`age`) before being abandoned.
//!
//! Intervals are kept on an explicit stack, right half pushed first, so that they are visited
//! in depth-first, left-to-right order.

use tracing::trace;

use crate::{
    constants::{AstronomicalUnit, Radian, AGE_LIMIT, MIN_ANGLE_STEP, MIN_DISTANCE_STEP},
    jitter::JitterRng,
    population::{bins::qei_bin, PopulationModel},
    ranging::{
        geometry::{DistanceGeometry, TrackletGeometry},
        hypothesis::solve_orbit,
        ScoringContext,
    },
};

/// Pending interval of a bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interval {
    pub lo: f64,
    pub hi: f64,
    pub age: u8,
}

impl Interval {
    #[inline]
    fn push_halves(stack: &mut Vec<Interval>, lo: f64, mid: f64, hi: f64, age: u8) {
        stack.push(Interval { lo: mid, hi, age });
        stack.push(Interval { lo, hi: mid, age });
    }
}

impl ScoringContext {
    /// Classify the orbit at angle `an` and tag its bin.
    ///
    /// Return
    /// ----------
    /// * `true` if a class saw the bin for the first time at this distance.
    pub(crate) fn tag_angle(&mut self, dist: &DistanceGeometry, an: Radian, dt: f64) -> bool {
        self.stats.hypotheses += 1;

        let Some(orbit) = solve_orbit(dist, an, dt) else {
            return false;
        };
        let Some(bin) = qei_bin(orbit.q, orbit.e, orbit.i, dist.h_bin) else {
            return false;
        };

        let membership = self
            .classes
            .iter()
            .map(|class| class.contains(orbit.q, orbit.e, orbit.i, dist.h));
        self.tags.tag(bin.flat(), membership)
    }

    /// Bisect the angle range `[a1, a2]`, sampling each interval at a jittered third.
    pub(crate) fn bisect_angles(
        &mut self,
        dist: &DistanceGeometry,
        a1: Radian,
        a2: Radian,
        dt: f64,
        rng: &mut JitterRng,
    ) {
        self.angle_stack.clear();
        self.angle_stack.push(Interval {
            lo: a1,
            hi: a2,
            age: 0,
        });

        while let Some(Interval { lo, hi, age }) = self.angle_stack.pop() {
            let d3 = (hi - lo) / 3.0;
            let mid = lo + d3 + d3 * rng.next_unit();

            if self.tag_angle(dist, mid, dt) || d3 > MIN_ANGLE_STEP {
                Interval::push_halves(&mut self.angle_stack, lo, mid, hi, 0);
            } else if age < AGE_LIMIT {
                Interval::push_halves(&mut self.angle_stack, lo, mid, hi, age + 1);
            }
        }
    }

    /// Search every angle at one distance and one line-of-sight pair, then add the newly
    /// reached bins to the class tallies.
    ///
    /// Return
    /// ----------
    /// * `true` if any tally received a new bin.
    pub(crate) fn search_angles(
        &mut self,
        dist: &DistanceGeometry,
        dt: f64,
        model: &PopulationModel,
        rng: &mut JitterRng,
    ) -> bool {
        let Some((a1, a2)) = dist.angle_range(dt) else {
            return false;
        };
        self.bisect_angles(dist, a1, a2, dt, rng);

        if self.tags.distance_is_empty() {
            return false;
        }
        self.tags.pool(model)
    }

    /// Search one topocentric distance, for every line-of-sight pair.
    ///
    /// Return
    /// ----------
    /// * `true` if this distance reached bins not counted at any previous distance.
    pub(crate) fn search_distance(
        &mut self,
        geometry: &TrackletGeometry,
        distance: AstronomicalUnit,
        model: &PopulationModel,
        rng: &mut JitterRng,
    ) -> bool {
        self.stats.distances += 1;
        self.tags.clear_distance();

        let mut fresh = false;
        for pair in &geometry.lines_of_sight {
            let dist = DistanceGeometry::new(geometry, pair, distance);
            fresh |= self.search_angles(&dist, geometry.dt, model, rng);
        }
        trace!(distance, fresh, "distance searched");
        fresh
    }

    /// Bisect the distance range `[d1, d2]` at interval midpoints.
    pub(crate) fn bisect_distances(
        &mut self,
        geometry: &TrackletGeometry,
        d1: AstronomicalUnit,
        d2: AstronomicalUnit,
        model: &PopulationModel,
        rng: &mut JitterRng,
    ) {
        let mut stack = vec![Interval {
            lo: d1,
            hi: d2,
            age: 0,
        }];

        while let Some(Interval { lo, hi, age }) = stack.pop() {
            let mid = (lo + hi) * 0.5;

            if self.search_distance(geometry, mid, model, rng) || hi - lo > MIN_DISTANCE_STEP {
                Interval::push_halves(&mut stack, lo, mid, hi, 0);
            } else if age < AGE_LIMIT {
                Interval::push_halves(&mut stack, lo, mid, hi, age + 1);
            }
        }
    }
}
