//! # Scoring configuration
//!
//! [`DigestParams`] gathers every setting that changes how tracklets are scored, and
//! [`DigestParamsBuilder`] validates them before a [`Digest`](crate::digest::Digest) is built.
//!
//! ## Overview
//!
//! | Setting           | Default              | Meaning                                                  |
//! |-------------------|----------------------|----------------------------------------------------------|
//! | `classes`         | whole catalog        | classes to score, in output order                        |
//! | `default_obs_err` | 1.0″                 | global astrometric uncertainty                           |
//! | `site_obs_err`    | none                 | per-site uncertainty overrides                           |
//! | `repeatable`      | `false`              | restart the jitter sequence before every tracklet        |
//! | `no_threshold`    | `false`              | do not cap per-observation uncertainties                 |
//! | `workers`         | available cores      | size of the worker pool                                  |
//!
//! ## See also
//! ------------
//! * [`crate::digest::Digest::new`] – consumes the parameters.

use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use crate::{
    constants::{ArcSec, Radian, DEFAULT_OBS_ERR, RADSEC, SITE_NAMESPACE_SIZE},
    conversion::{obscode_from_index, parse_obscode},
    digest_errors::DigestError,
    orbit_class::OrbitClass,
};

/// Upper bound on the worker pool size.
pub const MAX_WORKERS: usize = 1024;

/// Validated scoring configuration.
///
/// Build it with [`DigestParams::builder`], or use [`DigestParams::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct DigestParams {
    /// Classes to score, in output order
    pub classes: Vec<OrbitClass>,
    /// Global default astrometric uncertainty (arcsec)
    pub default_obs_err: ArcSec,
    /// Per-site uncertainty overrides: site index and uncertainty (arcsec)
    pub site_obs_err: Vec<(usize, ArcSec)>,
    /// Restart the jitter sequence from a fixed seed before each tracklet
    pub repeatable: bool,
    /// Only floor per-observation uncertainties, never cap them
    pub no_threshold: bool,
    /// Number of scoring threads
    pub workers: usize,
}

impl DigestParams {
    /// Equivalent to [`DigestParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder starting from the default parameters.
    ///
    /// ```rust,no_run
    /// use tracklet_digest::{orbit_class::OrbitClass, params::DigestParams};
    ///
    /// let params = DigestParams::builder()
    ///     .classes([OrbitClass::Neo, OrbitClass::MiddleMainBelt])
    ///     .default_obs_err(0.7)
    ///     .site_obs_err("G96", 0.3)
    ///     .repeatable(true)
    ///     .workers(4)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> DigestParamsBuilder {
        DigestParamsBuilder::new()
    }

    /// Global default uncertainty in radians.
    #[inline]
    pub fn default_obs_err_rad(&self) -> Radian {
        self.default_obs_err * RADSEC
    }
}

impl Default for DigestParams {
    fn default() -> Self {
        DigestParams {
            classes: OrbitClass::ALL.to_vec(),
            default_obs_err: DEFAULT_OBS_ERR,
            site_obs_err: Vec::new(),
            repeatable: false,
            no_threshold: false,
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

/// Site designation accepted by [`DigestParamsBuilder::site_obs_err`].
#[derive(Debug, Clone, PartialEq)]
enum SiteKey {
    Code(String),
    Index(usize),
}

/// Builder of [`DigestParams`], checked by [`DigestParamsBuilder::build`].
#[derive(Debug, Clone)]
pub struct DigestParamsBuilder {
    params: DigestParams,
    site_overrides: Vec<(SiteKey, ArcSec)>,
}

impl Default for DigestParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: DigestParams::default(),
            site_overrides: Vec::new(),
        }
    }

    pub fn classes(mut self, v: impl IntoIterator<Item = OrbitClass>) -> Self {
        self.params.classes = v.into_iter().collect();
        self
    }
    pub fn default_obs_err(mut self, v: ArcSec) -> Self {
        self.params.default_obs_err = v;
        self
    }
    /// Override the uncertainty of the site with MPC code `code`.
    pub fn site_obs_err(mut self, code: &str, v: ArcSec) -> Self {
        self.site_overrides.push((SiteKey::Code(code.to_string()), v));
        self
    }
    /// Override the uncertainty of the site at `index`.
    pub fn site_index_obs_err(mut self, index: usize, v: ArcSec) -> Self {
        self.site_overrides.push((SiteKey::Index(index), v));
        self
    }
    pub fn repeatable(mut self, v: bool) -> Self {
        self.params.repeatable = v;
        self
    }
    pub fn no_threshold(mut self, v: bool) -> Self {
        self.params.no_threshold = v;
        self
    }
    pub fn workers(mut self, v: usize) -> Self {
        self.params.workers = v;
        self
    }

    /// Return true iff x >= 0.0, finite and comparable.
    #[inline]
    fn ge0(x: f64) -> bool {
        x.is_finite() && matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Validate and return the parameters.
    ///
    /// Return
    /// ----------
    /// * The parameters, or [`DigestError::InvalidParameter`] naming the first invalid setting:
    ///   empty or duplicated class list, negative or non-finite uncertainty, unknown site, or a
    ///   worker count outside `1..=1024`.
    pub fn build(self) -> Result<DigestParams, DigestError> {
        let mut p = self.params;

        if p.classes.is_empty() {
            return Err(DigestError::InvalidParameter(
                "at least one orbit class is required".into(),
            ));
        }
        let mut seen = [false; OrbitClass::COUNT];
        for class in &p.classes {
            if std::mem::replace(&mut seen[class.index()], true) {
                return Err(DigestError::InvalidParameter(format!(
                    "orbit class {} listed twice",
                    class.abbreviation()
                )));
            }
        }

        if !Self::ge0(p.default_obs_err) {
            return Err(DigestError::InvalidParameter(
                "default_obs_err must be finite and non-negative".into(),
            ));
        }

        for (key, err) in self.site_overrides {
            let index = match key {
                SiteKey::Code(code) => parse_obscode(&code).map_err(|_| {
                    DigestError::InvalidParameter(format!("unknown observatory code {code:?}"))
                })?,
                SiteKey::Index(index) if index < SITE_NAMESPACE_SIZE => index,
                SiteKey::Index(index) => {
                    return Err(DigestError::InvalidParameter(format!(
                        "site index {index} out of range"
                    )))
                }
            };
            if !Self::ge0(err) {
                return Err(DigestError::InvalidParameter(format!(
                    "obs_err of site {index} must be finite and non-negative"
                )));
            }
            // last override of a site wins
            p.site_obs_err.retain(|(i, _)| *i != index);
            p.site_obs_err.push((index, err));
        }

        if !(1..=MAX_WORKERS).contains(&p.workers) {
            return Err(DigestError::InvalidParameter(format!(
                "workers must be in 1..={MAX_WORKERS}"
            )));
        }

        Ok(p)
    }
}

impl fmt::Display for DigestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = self
            .classes
            .iter()
            .map(|c| c.abbreviation())
            .collect::<Vec<_>>()
            .join(" ");

        if !f.alternate() {
            return write!(
                f,
                "DigestParams(classes=[{classes}], obs_err={:.3}\", sites={}, repeatable={}, no_threshold={}, workers={})",
                self.default_obs_err,
                self.site_obs_err.len(),
                self.repeatable,
                self.no_threshold,
                self.workers
            );
        }

        writeln!(f, "Digest Parameters")?;
        writeln!(f, "-----------------")?;
        writeln!(f, "  classes         = {classes}")?;
        writeln!(f, "  default_obs_err = {:.3} arcsec", self.default_obs_err)?;
        for (index, err) in &self.site_obs_err {
            let code = obscode_from_index(*index).unwrap_or_else(|_| index.to_string());
            writeln!(f, "  obs_err[{code}]    = {err:.3} arcsec")?;
        }
        writeln!(f, "  repeatable      = {}", self.repeatable)?;
        writeln!(f, "  no_threshold    = {}", self.no_threshold)?;
        write!(f, "  workers         = {}", self.workers)
    }
}
