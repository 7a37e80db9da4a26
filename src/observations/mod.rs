//! # Observations and tracklets
//!
//! Core input types of the scoring engine:
//!
//! - [`Observation`]: one astrometric position (time, RA, Dec) with its observing site,
//!   optional magnitude, optional space-based observer offset and optional per-observation
//!   uncertainties.
//! - [`Tracklet`]: a time-ordered arc of observations of one object.
//!
//! Sub-modules reduce a tracklet to the two-point motion vector consumed by the orbit search:
//!
//! - [`great_circle`]: constrained linear fit of the arc along a great circle.
//! - [`motion_vector`]: selection of the two representative endpoints and their uncertainty.
//!
//! ## See also
//! ------------
//! * [`crate::ranging`] – orbit search driven by the motion vector.
//! * [`to_v_band`] – photometric band correction applied when assembling observations.

pub mod great_circle;
pub mod motion_vector;

use nalgebra::Vector3;

use crate::{
    constants::{Designation, Observations, Radian, DEFAULT_VMAG, MJD, SITE_NAMESPACE_SIZE},
    conversion::parse_obscode,
    digest_errors::{DigestError, Rejection},
};

/// A single astrometric observation.
///
/// # Fields
///
/// * `time` - Time of the observation (MJD, UTC)
/// * `ra` - Right ascension in radians
/// * `dec` - Declination in radians
/// * `mag` - Apparent V magnitude, `0` when absent
/// * `site` - Observatory index in the site table
/// * `space_position` - Earth → observer vector (equatorial, AU) of a space-based observer
/// * `error_ra`, `error_dec` - Per-observation uncertainties in radians, `0` to use the configured default
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub time: MJD,
    pub ra: Radian,
    pub dec: Radian,
    pub mag: f64,
    pub(crate) site: u16,
    pub space_position: Option<Vector3<f64>>,
    pub error_ra: Radian,
    pub error_dec: Radian,
}

impl Observation {
    /// Create a new observation without magnitude nor uncertainty.
    ///
    /// Arguments
    /// ---------
    /// * `site`: observatory index in `0..3600`
    /// * `time`: the time of the observation (MJD)
    /// * `ra`, `dec`: position in radians
    ///
    /// Return
    /// ------
    /// * the observation, or [`DigestError::SiteIndexOutOfRange`]
    pub fn new(site: u16, time: MJD, ra: Radian, dec: Radian) -> Result<Self, DigestError> {
        if site as usize >= SITE_NAMESPACE_SIZE {
            return Err(DigestError::SiteIndexOutOfRange(site as usize));
        }
        Ok(Observation {
            time,
            ra,
            dec,
            mag: 0.0,
            site,
            space_position: None,
            error_ra: 0.0,
            error_dec: 0.0,
        })
    }

    /// Same as [`Observation::new`], taking the 3-character MPC code of the site.
    pub fn from_obscode(code: &str, time: MJD, ra: Radian, dec: Radian) -> Result<Self, DigestError> {
        let site = parse_obscode(code)? as u16;
        Self::new(site, time, ra, dec)
    }

    /// Attach an apparent V magnitude.
    pub fn with_magnitude(mut self, mag: f64) -> Self {
        self.mag = mag;
        self
    }

    /// Attach the Earth → observer vector of a space-based observer (equatorial, AU).
    pub fn with_space_position(mut self, position: Vector3<f64>) -> Self {
        self.space_position = Some(position);
        self
    }

    /// Attach per-observation uncertainties (radians).
    pub fn with_uncertainty(mut self, error_ra: Radian, error_dec: Radian) -> Self {
        self.error_ra = error_ra;
        self.error_dec = error_dec;
        self
    }

    /// Observatory index of the observation.
    #[inline]
    pub fn site(&self) -> u16 {
        self.site
    }

    #[inline]
    pub fn is_space_based(&self) -> bool {
        self.space_position.is_some()
    }
}

/// Convert a magnitude measured in a photometric band into an approximate V magnitude.
///
/// Absent magnitudes (`<= 0`) are returned unchanged. Unknown bands use the R-like offset.
pub fn to_v_band(mag: f64, band: char) -> f64 {
    if mag <= 0.0 {
        return mag;
    }
    let offset = match band {
        'V' | 'v' => 0.0,
        'B' => -0.8,
        'U' => -1.3,
        'g' => -0.35,
        'r' => 0.14,
        'R' | 'C' | 'W' => 0.4,
        'i' | 'y' => 0.32,
        'z' => 0.26,
        'I' => 0.8,
        'J' => 1.2,
        'w' => -0.13,
        'L' => 0.2,
        'H' => 1.4,
        'K' => 1.7,
        'Y' => 0.7,
        'G' => 0.28,
        'c' => -0.05,
        'o' => 0.33,
        'u' => 2.5,
        _ => 0.4,
    };
    mag + offset
}

/// A time-ordered arc of observations of one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tracklet {
    pub designation: Designation,
    pub observations: Observations,
}

impl Tracklet {
    pub fn new(designation: impl Into<Designation>, observations: Observations) -> Self {
        Tracklet {
            designation: designation.into(),
            observations,
        }
    }

    /// Check that the tracklet can be scored.
    ///
    /// Return
    /// ------
    /// * `Ok(())`, or [`DigestError::NotScorable`] carrying the first failed condition among:
    ///   fewer than two observations, non-finite time or position, decreasing time, no time span, no motion.
    pub fn validate(&self) -> Result<(), DigestError> {
        validate_observations(&self.designation, &self.observations)
    }

    /// Mean of the available magnitudes, or V = 21 when none is available.
    pub fn mean_vmag(&self) -> f64 {
        mean_vmag(&self.observations)
    }
}

pub(crate) fn validate_observations(
    designation: &str,
    observations: &[Observation],
) -> Result<(), DigestError> {
    let reject = |reason| DigestError::NotScorable {
        designation: designation.to_string(),
        reason,
    };

    let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
        return Err(reject(Rejection::SingleObservation));
    };
    if observations.len() < 2 {
        return Err(reject(Rejection::SingleObservation));
    }
    if observations
        .iter()
        .any(|o| !(o.time.is_finite() && o.ra.is_finite() && o.dec.is_finite()))
    {
        return Err(reject(Rejection::NonFiniteValue));
    }
    if observations.windows(2).any(|w| w[1].time < w[0].time) {
        return Err(reject(Rejection::NonMonotonicTime));
    }
    if last.time == first.time {
        return Err(reject(Rejection::NoTimeSpan));
    }
    if last.ra == first.ra && last.dec == first.dec {
        return Err(reject(Rejection::NoMotion));
    }
    Ok(())
}

pub(crate) fn mean_vmag(observations: &[Observation]) -> f64 {
    let (sum, count) = observations
        .iter()
        .filter(|o| o.mag > 0.0)
        .fold((0.0, 0usize), |(s, n), o| (s + o.mag, n + 1));
    if count == 0 {
        DEFAULT_VMAG
    } else {
        sum / count as f64
    }
}
