//! # Concurrent scoring pipeline
//!
//! One assembler (the calling thread) feeds a fixed pool of worker threads.
//!
//! ## Overview
//!
//! ```text
//!   tracklets ─▶ assembler ─▶ [staging slot] ─▶ worker 1..N ─▶ results channel
//!                   ▲                               │
//!                   └──────── [buffer pool] ◀───────┘
//! ```
//!
//! * The assembler copies each input tracklet into a buffer from the [`BufferPool`], waiting
//!   when every buffer is in use, then hands it over through the [`Staging`] slot.
//! * A worker takes the buffer, scores it with its own [`ScoringContext`] and [`JitterRng`],
//!   returns the buffer to the pool and sends the result.
//! * Results arrive in completion order, not input order.
//!
//! A worker that panics closes both the staging slot and the buffer pool on its way out. The
//! assembler then stops feeding, the remaining workers drain what was staged, and the panic is
//! propagated to the caller of [`run`].
//!
//! The staging slot and the buffer pool are two separate lock domains. No thread ever holds
//! both: every lock acquisition goes through a [`LockDomainGuard`], which panics if the
//! thread already holds the other domain.
//!
//! ## See also
//! ------------
//! * [`crate::digest::Digest::run_streaming`] – public entry point.
//! * [`crate::digest::Digest::score_all`] – collects the results into a map.

pub mod buffer_pool;
#[cfg(feature = "progress")]
pub mod progress_bar;
pub mod staging;

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam::channel::Sender;
use tracing::{info, warn};

use crate::{
    constants::Designation,
    digest::Digest,
    digest_errors::DigestError,
    jitter::JitterRng,
    observations::Tracklet,
    pipeline::{
        buffer_pool::{BufferPool, PooledTracklet},
        staging::Staging,
    },
    ranging::ScoringContext,
    score::ScoreResult,
};

/// Outcome of scoring one tracklet, as sent on the results channel.
#[derive(Debug, PartialEq)]
pub struct ScoreMessage {
    /// Designation of the scored tracklet
    pub designation: Designation,
    pub result: Result<ScoreResult, DigestError>,
}

/// The two synchronization domains of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockDomain {
    Staging,
    Pool,
}

thread_local! {
    static HELD_DOMAIN: Cell<Option<LockDomain>> = const { Cell::new(None) };
}

/// Marks the current thread as inside one lock domain until dropped.
pub(crate) struct LockDomainGuard {
    previous: Option<LockDomain>,
}

impl LockDomainGuard {
    /// Enter `domain`.
    ///
    /// Panics if the thread is inside the other domain.
    pub(crate) fn enter(domain: LockDomain) -> Self {
        let previous = HELD_DOMAIN.with(|held| held.replace(Some(domain)));
        if let Some(other) = previous.filter(|d| *d != domain) {
            HELD_DOMAIN.with(|held| held.set(previous));
            panic!("lock domain {domain:?} entered while holding {other:?}");
        }
        LockDomainGuard { previous }
    }
}

impl Drop for LockDomainGuard {
    fn drop(&mut self) {
        HELD_DOMAIN.with(|held| held.set(self.previous));
    }
}

/// Counters of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Tracklets handed to the workers
    pub submitted: usize,
    /// Tracklets that could not be scored
    pub rejected: usize,
}

/// Score every tracklet of `tracklets` on `digest.params().workers` threads.
///
/// Arguments
/// ---------
/// * `digest`: shared scoring state
/// * `tracklets`: input, consumed on the calling thread
/// * `results`: receives one message per input tracklet, in completion order. A bounded
///   channel must be drained by another thread while this function runs.
///
/// Return
/// ----------
/// * Counters of the run. Results not delivered because the receiver was dropped are still
///   counted.
pub fn run<I>(digest: &Digest, tracklets: I, results: &Sender<ScoreMessage>) -> PipelineStats
where
    I: IntoIterator<Item = Tracklet>,
{
    let workers = digest.params().workers;
    let start = Instant::now();

    info!(
        workers,
        repeatable = digest.params().repeatable,
        "Starting scoring pipeline"
    );

    let stats = run_with(workers, tracklets, results, |_| {
        let mut ctx: ScoringContext = digest.new_context();
        let mut rng: JitterRng = digest.new_rng();
        move |tracklet: &Tracklet| digest.score_with(tracklet, &mut ctx, &mut rng)
    });

    info!(
        submitted = stats.submitted,
        rejected = stats.rejected,
        elapsed = ?start.elapsed(),
        "Scoring pipeline finished"
    );
    stats
}

/// Assembler and worker pool around any per-worker scoring function.
///
/// `new_scorer(id)` is called on worker `id`'s own thread, so the scorer it returns may own
/// non-`Send` working state.
fn run_with<I, F, S>(
    workers: usize,
    tracklets: I,
    results: &Sender<ScoreMessage>,
    new_scorer: F,
) -> PipelineStats
where
    I: IntoIterator<Item = Tracklet>,
    F: Fn(usize) -> S + Sync,
    S: FnMut(&Tracklet) -> Result<ScoreResult, DigestError>,
{
    let staging: Staging<PooledTracklet> = Staging::new();
    let pool = BufferPool::new(workers);
    let rejected = AtomicUsize::new(0);

    let submitted = std::thread::scope(|s| {
        for id in 0..workers {
            let results = results.clone();
            let (staging, pool, rejected, new_scorer) = (&staging, &pool, &rejected, &new_scorer);
            s.spawn(move || worker_loop(id, staging, pool, rejected, results, new_scorer));
        }

        let mut submitted = 0;
        for tracklet in tracklets {
            let Some(mut buffer) = pool.acquire() else {
                break;
            };
            buffer.fill(&tracklet.designation, &tracklet.observations);
            if let Err(buffer) = staging.put(buffer) {
                pool.release(buffer);
                break;
            }
            submitted += 1;
        }
        staging.close();
        submitted
    });

    PipelineStats {
        submitted,
        rejected: rejected.into_inner(),
    }
}

/// Closes the staging slot and the buffer pool if its worker unwinds.
struct ShutdownOnPanic<'a> {
    staging: &'a Staging<PooledTracklet>,
    pool: &'a BufferPool,
}

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.staging.close();
            self.pool.close();
        }
    }
}

fn worker_loop<F, S>(
    id: usize,
    staging: &Staging<PooledTracklet>,
    pool: &BufferPool,
    rejected: &AtomicUsize,
    results: Sender<ScoreMessage>,
    new_scorer: &F,
) where
    F: Fn(usize) -> S,
    S: FnMut(&Tracklet) -> Result<ScoreResult, DigestError>,
{
    let _shutdown = ShutdownOnPanic { staging, pool };
    let mut score = new_scorer(id);
    let mut receiver_gone = false;

    while let Some(buffer) = staging.take() {
        let result = score(&buffer.tracklet);
        let designation = buffer.tracklet.designation.clone();
        pool.release(buffer);

        if result.is_err() {
            rejected.fetch_add(1, Ordering::Relaxed);
        }
        let message = ScoreMessage {
            designation,
            result,
        };
        if results.send(message).is_err() && !receiver_gone {
            receiver_gone = true;
            warn!(worker = id, "Results receiver dropped, discarding results");
        }
    }
}
