//! Progress display of batch scoring (`progress` feature).
//!
//! The bar advances once per result received by [`crate::digest::Digest::score_all`]. Its
//! message shows the smoothed pace of the workers and the number of rejected tracklets.
//!
//! ## See also
//! ------------
//! * [`ResultPace`] – smoothed time between results.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{digest_errors::DigestError, score::ScoreResult};

const BAR_TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {pos} tracklets | {per_sec} | {elapsed} | {msg}";

/// Time between consecutive results, smoothed with weight `weight` on the latest interval.
#[derive(Debug, Clone)]
pub struct ResultPace {
    since: Instant,
    smoothed: Option<Duration>,
    weight: f64,
}

impl ResultPace {
    /// `weight` is clamped to `[0, 1]`; `1` keeps only the latest interval.
    pub fn new(weight: f64) -> Self {
        ResultPace {
            since: Instant::now(),
            smoothed: None,
            weight: weight.clamp(0.0, 1.0),
        }
    }

    /// Mark the arrival of a result and return the interval since the previous one.
    pub fn mark(&mut self) -> Duration {
        let now = Instant::now();
        let interval = now.duration_since(self.since);
        self.since = now;
        self.smoothed = Some(self.blend(interval));
        interval
    }

    fn blend(&self, interval: Duration) -> Duration {
        match self.smoothed {
            None => interval,
            Some(previous) => {
                interval.mul_f64(self.weight) + previous.mul_f64(1.0 - self.weight)
            }
        }
    }

    /// Smoothed interval, zero before the first result.
    pub fn smoothed(&self) -> Duration {
        self.smoothed.unwrap_or_default()
    }
}

/// Short rendering of an interval: microseconds, tenths of milliseconds or seconds.
pub fn short_duration(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{:.1}ms", us as f64 / 1_000.0),
        _ => format!("{:.2}s", d.as_secs_f64()),
    }
}

/// Progress bar over the results of a batch.
pub struct ScoringProgress {
    bar: ProgressBar,
    pace: ResultPace,
    rejected: u64,
}

impl ScoringProgress {
    /// Bar of length `total` when the batch size is known, a spinner otherwise.
    pub fn new(total: Option<u64>) -> Self {
        let (bar, template) = match total {
            Some(n) => (ProgressBar::new(n.max(1)), BAR_TEMPLATE),
            None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        ScoringProgress {
            bar,
            pace: ResultPace::new(0.2),
            rejected: 0,
        }
    }

    /// Account for one result.
    pub fn record(&mut self, result: &Result<ScoreResult, DigestError>) {
        if result.is_err() {
            self.rejected += 1;
        }
        self.pace.mark();
        self.bar.set_message(format!(
            "pace {} | rejected {}",
            short_duration(self.pace.smoothed()),
            self.rejected
        ));
        self.bar.inc(1);
    }

    pub fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}
