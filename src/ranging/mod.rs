//! # Orbit search
//!
//! Explores the orbits compatible with a motion vector and accumulates, for every configured
//! class, the population mass of the bins they reach.
//!
//! ## Overview
//!
//! An orbit hypothesis is indexed by the topocentric distance `d` of the object at the first
//! endpoint (`0.05 ≤ d ≤ 100` AU) and by a free angle fixing its distance at the second endpoint.
//!
//! 1. For each distance, the admissible angle range is solved analytically (bound orbits only).
//! 2. The angle range is bisected adaptively (see [`bisection`]); each sampled angle yields an
//!    orbit `(q, e, i)` and, with the absolute magnitude implied at that distance, a population
//!    bin. Bins are tagged in or out of every class.
//! 3. After each distance the new bins are pooled into the class tallies, in-class bins adding
//!    the class population, out-of-class bins adding the rest of the population of the bin.
//! 4. The distance range is bisected the same way, starting with both extremes.
//!
//! Astrometric uncertainty is folded in by repeating each distance for nine line-of-sight pairs
//! offset by half the endpoint uncertainties (a single pair for exact astrometry).
//!
//! All scratch state lives in a [`ScoringContext`], owned by one worker and reused across
//! tracklets.
//!
//! ## See also
//! ------------
//! * [`geometry`] – per-tracklet and per-distance vectors.
//! * [`hypothesis`] – orbit of one hypothesis.
//! * [`tags`] – bin tags and class tallies.
//! * [`crate::digest::Digest`] – drives the search for each tracklet.

pub mod bisection;
pub mod geometry;
pub mod hypothesis;
pub mod tags;

use tracing::trace;

use crate::{
    constants::{MAX_DISTANCE, MIN_DISTANCE},
    jitter::JitterRng,
    orbit_class::OrbitClass,
    population::PopulationModel,
    ranging::{bisection::Interval, geometry::TrackletGeometry, tags::TagState},
};

pub use tags::ClassTally;

/// Counters of the last search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Number of distances searched
    pub distances: usize,
    /// Number of (distance, angle) hypotheses evaluated
    pub hypotheses: usize,
}

/// Reusable working state of the orbit search.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    classes: Vec<OrbitClass>,
    tags: TagState,
    angle_stack: Vec<Interval>,
    stats: SearchStats,
}

impl ScoringContext {
    /// Working state for scoring the given classes, in that order.
    pub fn new(classes: &[OrbitClass]) -> Self {
        ScoringContext {
            classes: classes.to_vec(),
            tags: TagState::new(classes),
            angle_stack: Vec::with_capacity(64),
            stats: SearchStats::default(),
        }
    }

    pub fn classes(&self) -> &[OrbitClass] {
        &self.classes
    }

    /// Class tallies of the last search, in class order.
    pub fn tallies(&self) -> &[ClassTally] {
        self.tags.tallies()
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn reset(&mut self) {
        self.tags.reset();
        self.angle_stack.clear();
        self.stats = SearchStats::default();
    }

    /// Run the full orbit search of one tracklet.
    ///
    /// Any state left by a previous search is discarded first.
    ///
    /// Arguments
    /// ---------
    /// * `geometry`: geometry of the tracklet's motion vector
    /// * `model`: population model
    /// * `rng`: jitter sequence of the calling worker
    ///
    /// Return
    /// ----------
    /// * The class tallies, also available through [`ScoringContext::tallies`].
    pub fn search(
        &mut self,
        geometry: &TrackletGeometry,
        model: &PopulationModel,
        rng: &mut JitterRng,
    ) -> &[ClassTally] {
        self.reset();

        self.search_distance(geometry, MIN_DISTANCE, model, rng);
        self.search_distance(geometry, MAX_DISTANCE, model, rng);
        self.bisect_distances(geometry, MIN_DISTANCE, MAX_DISTANCE, model, rng);

        trace!(
            distances = self.stats.distances,
            hypotheses = self.stats.hypotheses,
            "orbit search done"
        );
        self.tags.tallies()
    }
}

#[cfg(test)]
mod ranging_test {
    use super::*;
    use crate::{
        constants::{Observations, RADEG, RADSEC},
        observations::{motion_vector::MotionVector, Observation},
        observers::{Site, SiteTable},
        population::BinMass,
    };
    use smallvec::smallvec;

    /// Unit mass in every bin, the NEO class holding every bin with q < 1.3.
    fn uniform_model() -> PopulationModel {
        let unit = BinMass {
            all: 1.0,
            unknown: 0.5,
        };
        PopulationModel::from_fn(
            |_| unit,
            |class, bin| {
                if class == OrbitClass::Neo && bin.q < 8 {
                    unit
                } else {
                    BinMass::default()
                }
            },
        )
    }

    /// 0.5°/hour mover seen one hour apart from a ground site.
    fn fast_geometry(sites: &SiteTable) -> TrackletGeometry {
        let t0 = 60200.25;
        let obs: Observations = smallvec![
            Observation::from_obscode("G96", t0, 300.0 * RADEG, -10.0 * RADEG).unwrap(),
            Observation::from_obscode("G96", t0 + 1.0 / 24.0, 300.0 * RADEG, -9.5 * RADEG)
                .unwrap(),
        ];
        let mv = MotionVector::from_observations(&obs, sites);
        TrackletGeometry::new(&mv, sites, RADSEC, false, 21.0)
    }

    fn sites() -> SiteTable {
        let mut sites = SiteTable::new();
        sites
            .insert(
                crate::conversion::parse_obscode("G96").unwrap(),
                Site::from_parallax(249.21128, 0.845111, 0.533614, None),
            )
            .unwrap();
        sites
    }

    #[test]
    fn test_far_distance_tags_nothing() {
        let sites = sites();
        let geometry = fast_geometry(&sites);
        let model = uniform_model();
        let mut ctx = ScoringContext::new(&[OrbitClass::Neo]);
        let mut rng = JitterRng::repeatable();

        // A 12°/day motion at 100 AU is far beyond escape speed
        assert!(!ctx.search_distance(&geometry, MAX_DISTANCE, &model, &mut rng));
        assert_eq!(ctx.stats().hypotheses, 0);
        assert_eq!(ctx.tallies()[0], ClassTally::new(OrbitClass::Neo));

        // The closest distance has bound solutions
        assert!(ctx.search_distance(&geometry, MIN_DISTANCE, &model, &mut rng));
        assert!(ctx.stats().hypotheses > 0);
        assert!(ctx.tallies()[0].all_in > 0.0);
    }

    #[test]
    fn test_search_resets_between_tracklets() {
        let sites = sites();
        let geometry = fast_geometry(&sites);
        let model = uniform_model();
        let mut ctx = ScoringContext::new(&[OrbitClass::Neo, OrbitClass::OuterMainBelt]);

        let first = ctx
            .search(&geometry, &model, &mut JitterRng::repeatable())
            .to_vec();
        let stats = ctx.stats();
        let second = ctx
            .search(&geometry, &model, &mut JitterRng::repeatable())
            .to_vec();

        assert_eq!(first, second);
        assert_eq!(stats, ctx.stats());
        assert!(stats.distances > 2);
        assert_eq!(first[0].class, OrbitClass::Neo);
        assert_eq!(first[0].raw_score(), 100.0);
        assert_eq!(first[1].raw_score(), 0.0);
    }

    #[test]
    fn test_reached_mass_only_grows() {
        let sites = sites();
        let geometry = fast_geometry(&sites);
        let model = uniform_model();
        let mut ctx = ScoringContext::new(&[OrbitClass::Neo, OrbitClass::OuterMainBelt]);
        let mut rng = JitterRng::repeatable();

        let mut previous = vec![0.0; 2];
        for distance in [0.05, 0.5, 0.1, 0.3, 0.08, 0.2, 0.06] {
            ctx.search_distance(&geometry, distance, &model, &mut rng);
            for (tally, prev) in ctx.tallies().iter().zip(previous.iter_mut()) {
                let total = tally.all_in + tally.all_out;
                assert!(total >= *prev, "{:?} shrank at {distance} AU", tally.class);
                assert!((0.0..=100.0).contains(&tally.raw_score()));
                *prev = total;
            }
        }
    }

    #[test]
    fn test_zero_population_uses_fallback() {
        let sites = sites();
        let geometry = fast_geometry(&sites);
        let empty = PopulationModel::from_fn(|_| BinMass::default(), |_, _| BinMass::default());
        let mut ctx = ScoringContext::new(&OrbitClass::ALL);
        let tallies = ctx.search(&geometry, &empty, &mut JitterRng::repeatable());

        for tally in tallies {
            assert_eq!(tally.raw_score(), tally.class.empty_score());
            assert_eq!(tally.noid_score(), tally.class.empty_score());
        }
    }
}
