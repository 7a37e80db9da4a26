//! # Digest: tracklet scoring façade
//!
//! [`Digest`] owns everything shared by the scoring threads: the population model, the site
//! table (with the configured uncertainty overrides applied) and the validated parameters.
//! Both the model and the site table are read-only once the `Digest` is built and are shared
//! through [`Arc`] without any locking.
//!
//! ## Scoring a tracklet
//!
//! 1. Validate the tracklet (see [`Tracklet::validate`]).
//! 2. Reduce it to a [`MotionVector`].
//! 3. Set up the search geometry, including the endpoint uncertainties.
//! 4. Run the orbit search ([`ScoringContext::search`]).
//! 5. Turn the class tallies into a [`ScoreResult`].
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use tracklet_digest::{
//!     digest::Digest, observers::SiteTable, params::DigestParams, population::PopulationModel,
//! };
//!
//! let model = PopulationModel::from_csv_file(Utf8Path::new("digest2.model.csv")).unwrap();
//! let sites = SiteTable::from_obscodes_file(Utf8Path::new("ObsCodes.html")).unwrap();
//! let params = DigestParams::builder().repeatable(true).build().unwrap();
//! let digest = Digest::new(model, sites, params).unwrap();
//!
//! # let tracklets: Vec<tracklet_digest::observations::Tracklet> = vec![];
//! let results = digest.score_all(tracklets);
//! ```
//!
//! ## See also
//! ------------
//! * [`crate::pipeline`] – the worker pool behind [`Digest::score_all`].
//! * [`crate::params::DigestParams`] – configuration.

use std::{collections::HashMap, sync::Arc, time::Instant};

use crossbeam::channel::{unbounded, Sender};
use tracing::debug;

use crate::{
    constants::{Designation, REPEATABLE_SEED},
    digest_errors::DigestError,
    jitter::JitterRng,
    observations::{motion_vector::MotionVector, Tracklet},
    observers::SiteTable,
    params::DigestParams,
    pipeline::{self, PipelineStats, ScoreMessage},
    population::PopulationModel,
    ranging::{geometry::TrackletGeometry, ScoringContext},
    score::ScoreResult,
};

/// Results of a batch, keyed by designation.
pub type FullScoreResult = HashMap<Designation, Result<ScoreResult, DigestError>, ahash::RandomState>;

/// Shared scoring state.
#[derive(Debug, Clone)]
pub struct Digest {
    model: Arc<PopulationModel>,
    sites: Arc<SiteTable>,
    params: DigestParams,
}

impl Digest {
    /// Build the scoring state.
    ///
    /// Arguments
    /// ---------
    /// * `model`: population model, owned or already shared
    /// * `sites`: site table; the per-site uncertainty overrides of `params` are applied to it
    /// * `params`: validated parameters
    ///
    /// Return
    /// ----------
    /// * The `Digest`, or [`DigestError::SiteIndexOutOfRange`] if an override names a site
    ///   outside the table.
    pub fn new(
        model: impl Into<Arc<PopulationModel>>,
        mut sites: SiteTable,
        params: DigestParams,
    ) -> Result<Self, DigestError> {
        for &(index, obs_err) in &params.site_obs_err {
            sites.set_obs_err(index, obs_err)?;
        }
        Ok(Digest {
            model: model.into(),
            sites: Arc::new(sites),
            params,
        })
    }

    pub fn params(&self) -> &DigestParams {
        &self.params
    }

    pub fn model(&self) -> &PopulationModel {
        &self.model
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    /// Fresh working state for the configured classes.
    pub fn new_context(&self) -> ScoringContext {
        ScoringContext::new(&self.params.classes)
    }

    /// Jitter generator for a new worker: the fixed sequence in repeatable mode, a randomly
    /// seeded one otherwise.
    pub fn new_rng(&self) -> JitterRng {
        if self.params.repeatable {
            JitterRng::repeatable()
        } else {
            JitterRng::from_rng(&mut rand::rng())
        }
    }

    /// Score one tracklet with a throwaway context and generator.
    pub fn score(&self, tracklet: &Tracklet) -> Result<ScoreResult, DigestError> {
        let mut ctx = self.new_context();
        let mut rng = self.new_rng();
        self.score_with(tracklet, &mut ctx, &mut rng)
    }

    /// Score one tracklet with caller-owned working state.
    ///
    /// Arguments
    /// ---------
    /// * `tracklet`: the tracklet to score
    /// * `ctx`: working state, built by [`Digest::new_context`]
    /// * `rng`: jitter generator of the caller, restarted first in repeatable mode
    ///
    /// Return
    /// ----------
    /// * The scores of every configured class, or [`DigestError::NotScorable`] if the tracklet
    ///   is rejected. [`DigestError::InvalidParameter`] if `ctx` was built for other classes.
    pub fn score_with(
        &self,
        tracklet: &Tracklet,
        ctx: &mut ScoringContext,
        rng: &mut JitterRng,
    ) -> Result<ScoreResult, DigestError> {
        if ctx.classes() != self.params.classes.as_slice() {
            return Err(DigestError::InvalidParameter(
                "scoring context built for a different class list".into(),
            ));
        }
        tracklet.validate()?;

        if self.params.repeatable {
            rng.reseed(REPEATABLE_SEED);
        }
        let start = Instant::now();

        let mv = MotionVector::from_observations(&tracklet.observations, &self.sites);
        let geometry = TrackletGeometry::new(
            &mv,
            &self.sites,
            self.params.default_obs_err_rad(),
            self.params.no_threshold,
            tracklet.mean_vmag(),
        );
        let tallies = ctx.search(&geometry, &self.model, rng);
        let result = ScoreResult::from_tallies(&tracklet.designation, tallies, mv.rms);

        debug!(
            designation = %tracklet.designation,
            rms = mv.rms,
            distances = ctx.stats().distances,
            hypotheses = ctx.stats().hypotheses,
            elapsed = ?start.elapsed(),
            "Tracklet scored"
        );
        Ok(result)
    }

    /// Score a batch on the worker pool and send each result as soon as it is ready.
    ///
    /// See [`pipeline::run`] for the channel requirements.
    pub fn run_streaming<I>(&self, tracklets: I, results: &Sender<ScoreMessage>) -> PipelineStats
    where
        I: IntoIterator<Item = Tracklet>,
    {
        pipeline::run(self, tracklets, results)
    }

    /// Score a batch on the worker pool.
    ///
    /// Failures are reported per tracklet and never interrupt the batch. When two tracklets
    /// share a designation, the last one to finish is kept.
    pub fn score_all<I>(&self, tracklets: I) -> FullScoreResult
    where
        I: IntoIterator<Item = Tracklet>,
    {
        let tracklets = tracklets.into_iter();
        let total = match tracklets.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower as u64),
            _ => None,
        };
        let (tx, rx) = unbounded::<ScoreMessage>();

        std::thread::scope(|s| {
            let collector = s.spawn(move || collect(rx, total));
            self.run_streaming(tracklets, &tx);
            drop(tx);
            match collector.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        })
    }
}

#[cfg(not(feature = "progress"))]
fn collect(rx: crossbeam::channel::Receiver<ScoreMessage>, _total: Option<u64>) -> FullScoreResult {
    let mut results = FullScoreResult::default();
    for message in rx {
        insert_result(&mut results, message);
    }
    results
}

#[cfg(feature = "progress")]
fn collect(rx: crossbeam::channel::Receiver<ScoreMessage>, total: Option<u64>) -> FullScoreResult {
    use crate::pipeline::progress_bar::ScoringProgress;

    let mut results = FullScoreResult::default();
    let mut progress = ScoringProgress::new(total);
    for message in rx {
        progress.record(&message.result);
        insert_result(&mut results, message);
    }
    progress.finish();
    results
}

fn insert_result(results: &mut FullScoreResult, message: ScoreMessage) {
    results.insert(message.designation, message.result);
}
