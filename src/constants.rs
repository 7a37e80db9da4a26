//! # Constants and type definitions for tracklet-digest
//!
//! This module centralizes the **physical constants**, **conversion factors**, **search limits**
//! and **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical constants (Gaussian gravitational constant, Earth radius in AU)
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ radians)
//! - Core type aliases used across the crate
//! - Limits of the distance / angle search performed by [`crate::ranging`]
//! - Container type for the observations of a single tracklet

use crate::observations::Observation;
use smallvec::SmallVec;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Gaussian gravitational constant k (used in classical orbit dynamics)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter in AU³/day²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// 1/k, converts a velocity in AU/day into the working units where G·M☉ = 1
pub const INV_GAUSS_GRAV: f64 = 1.0 / GAUSS_GRAV;

/// Earth equatorial radius expressed in astronomical units, as used by the MPC parallax constants
pub const EARTH_RADIUS_AU: f64 = 6.37814e6 / 149.59787e9;

// -------------------------------------------------------------------------------------------------
// Search limits
// -------------------------------------------------------------------------------------------------

/// Closest topocentric distance explored by the orbit search (AU)
pub const MIN_DISTANCE: AstronomicalUnit = 0.05;

/// Farthest topocentric distance explored by the orbit search (AU)
pub const MAX_DISTANCE: AstronomicalUnit = 100.0;

/// Distance interval width above which bisection always continues (AU)
pub const MIN_DISTANCE_STEP: AstronomicalUnit = 0.2;

/// Angle interval third-width above which bisection always continues (radians)
pub const MIN_ANGLE_STEP: Radian = 0.1;

/// Number of unproductive bisection levels explored before a branch is abandoned
pub const AGE_LIMIT: u8 = 1;

/// Eccentricity above which a hypothesis is discarded as numerically unstable
pub const MAX_ECCENTRICITY: f64 = 0.99;

/// Absolute magnitude assigned when the object sits exactly on the sun-ward line
pub const DEGENERATE_H: f64 = 30.0;

/// Apparent V magnitude assumed when no observation carries a magnitude
pub const DEFAULT_VMAG: f64 = 21.0;

/// Longest span (days) of a same-site arc reduced by a single great-circle fit
pub const SHORT_ARC_SPAN: f64 = 0.125;

/// Tolerance used to check that the fitted great circle passes through its anchor points
pub const GREAT_CIRCLE_TOLERANCE: Radian = RADSEC;

/// Global default angular uncertainty of an observation (arcseconds)
pub const DEFAULT_OBS_ERR: ArcSec = 1.0;

/// Ceiling applied to per-observation uncertainties, as a multiple of the configured error
pub const OBS_ERR_CEILING_FACTOR: f64 = 5.0;

/// Seed of the jitter sequence in repeatable mode
pub const REPEATABLE_SEED: u64 = 3;

/// Size of the observatory index namespace (all 3-character codes `000`..`Z99`)
pub const SITE_NAMESPACE_SIZE: usize = 3600;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in astronomical units
pub type AstronomicalUnit = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Designation of the object a tracklet belongs to
pub type Designation = String;

/// A small, inline-optimized container for observations of a single tracklet.
pub type Observations = SmallVec<[Observation; 6]>;
