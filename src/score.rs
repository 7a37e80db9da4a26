//! Per-tracklet scoring result.

use serde::Serialize;

use crate::{
    constants::{ArcSec, Designation},
    orbit_class::OrbitClass,
    ranging::ClassTally,
};

/// Scores of one orbit class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScore {
    pub class: OrbitClass,
    /// Percentage of the reached population inside the class, `[0, 100]`
    pub raw: f64,
    /// Same percentage over the uncataloged population
    pub noid: f64,
}

impl From<&ClassTally> for ClassScore {
    fn from(tally: &ClassTally) -> Self {
        ClassScore {
            class: tally.class,
            raw: tally.raw_score(),
            noid: tally.noid_score(),
        }
    }
}

/// Outcome of scoring one tracklet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub designation: Designation,
    /// One entry per configured class, in configuration order
    pub scores: Vec<ClassScore>,
    /// Great-circle RMS of the tracklet (arcsec)
    pub rms: ArcSec,
}

impl ScoreResult {
    pub(crate) fn from_tallies(designation: &str, tallies: &[ClassTally], rms: ArcSec) -> Self {
        ScoreResult {
            designation: designation.to_string(),
            scores: tallies.iter().map(ClassScore::from).collect(),
            rms,
        }
    }

    /// Scores of `class`, if it was configured.
    pub fn get(&self, class: OrbitClass) -> Option<&ClassScore> {
        self.scores.iter().find(|s| s.class == class)
    }

    /// Raw score of `class`, if it was configured.
    pub fn raw(&self, class: OrbitClass) -> Option<f64> {
        self.get(class).map(|s| s.raw)
    }

    /// No-ID score of `class`, if it was configured.
    pub fn noid(&self, class: OrbitClass) -> Option<f64> {
        self.get(class).map(|s| s.noid)
    }
}
