//! # Observing sites
//!
//! This module gathers **observatory handling** for the scoring engine:
//!
//! - [`Site`]: parallax constants of one observatory (ρ·cosφ, ρ·sinφ in AU, east longitude in
//!   fractional turns) plus an optional override of the default angular uncertainty.
//! - [`SiteTable`]: a dense table of 3600 entries indexed by the packed 3-character MPC code
//!   (see [`crate::conversion::parse_obscode`]). Loaded once, then shared read-only by all workers.
//! - [`observatories`]: loader for the MPC `ObsCodes` fixed-width list.
//! - [`earth_position`]: approximate geocentric position of the Sun.
//! - [`observer_position`]: heliocentric position of an observer, in the ecliptic frame of date.
//!
//! ## Units
//!
//! - Longitude: **turns** (degrees / 360), east positive.
//! - Parallax constants: **AU** (Earth radii scaled by [`EARTH_RADIUS_AU`]).
//! - Angular uncertainty overrides: **radians**.
//!
//! A site whose parallax constants are both zero is unknown or not ground-based: observations
//! from it are never interpolated when building a motion vector.
//!
//! ## See also
//! ------------
//! * [`crate::observations::motion_vector`] – consumes the site table when selecting endpoints.
//! * [`crate::ranging`] – consumes observer positions and uncertainty overrides.

pub mod earth_position;
pub mod observatories;
pub mod observer_position;

use crate::constants::{ArcSec, Radian, EARTH_RADIUS_AU, RADSEC, SITE_NAMESPACE_SIZE};
use crate::conversion::parse_obscode;
use crate::digest_errors::DigestError;

/// Parallax constants and configuration of one observatory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Site {
    /// East longitude in fractional turns, `[0, 1)`
    pub longitude: f64,
    /// ρ·cosφ in astronomical units
    pub rho_cos_phi: f64,
    /// ρ·sinφ in astronomical units
    pub rho_sin_phi: f64,
    /// Observatory name, when known
    pub name: Option<String>,
    /// Site-specific default angular uncertainty, overriding the global default
    pub obs_err: Option<Radian>,
}

impl Site {
    /// Build a site from the MPC representation of its parallax constants.
    ///
    /// Arguments
    /// ---------
    /// * `longitude`: east longitude in degrees
    /// * `rho_cos_phi`, `rho_sin_phi`: parallax constants in Earth radii
    /// * `name`: optional observatory name
    pub fn from_parallax(
        longitude: f64,
        rho_cos_phi: f64,
        rho_sin_phi: f64,
        name: Option<String>,
    ) -> Self {
        Site {
            longitude: (longitude / 360.0).rem_euclid(1.0),
            rho_cos_phi: rho_cos_phi * EARTH_RADIUS_AU,
            rho_sin_phi: rho_sin_phi * EARTH_RADIUS_AU,
            name,
            obs_err: None,
        }
    }

    /// `false` for unknown sites and for sites without a fixed position on the Earth.
    #[inline]
    pub fn is_ground_based(&self) -> bool {
        self.rho_cos_phi != 0.0 || self.rho_sin_phi != 0.0
    }

    /// Default angular uncertainty of this site, falling back to `global` when unset.
    #[inline]
    pub fn default_error(&self, global: Radian) -> Radian {
        self.obs_err.unwrap_or(global)
    }
}

/// Dense table of every observatory addressable by a 3-character MPC code.
#[derive(Debug, Clone)]
pub struct SiteTable {
    sites: Vec<Site>,
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteTable {
    /// A table where every site is unset.
    pub fn new() -> Self {
        SiteTable {
            sites: vec![Site::default(); SITE_NAMESPACE_SIZE],
        }
    }

    /// Site at `index`. Indices of validated observations are always in range.
    ///
    /// Panics if `index >= 3600`.
    #[inline]
    pub fn site(&self, index: u16) -> &Site {
        &self.sites[index as usize]
    }

    /// Site registered under an MPC code.
    pub fn by_code(&self, code: &str) -> Result<&Site, DigestError> {
        let idx = parse_obscode(code)?;
        Ok(&self.sites[idx])
    }

    /// Register (or replace) the site at `index`, keeping any configured uncertainty override.
    pub fn insert(&mut self, index: usize, site: Site) -> Result<(), DigestError> {
        let slot = self
            .sites
            .get_mut(index)
            .ok_or(DigestError::SiteIndexOutOfRange(index))?;
        let obs_err = slot.obs_err.or(site.obs_err);
        *slot = Site { obs_err, ..site };
        Ok(())
    }

    /// Override the default angular uncertainty of one site.
    ///
    /// Arguments
    /// ---------
    /// * `index`: site index in `0..3600`
    /// * `obs_err`: uncertainty in arcseconds
    pub fn set_obs_err(&mut self, index: usize, obs_err: ArcSec) -> Result<(), DigestError> {
        let slot = self
            .sites
            .get_mut(index)
            .ok_or(DigestError::SiteIndexOutOfRange(index))?;
        slot.obs_err = Some(obs_err * RADSEC);
        Ok(())
    }

    /// Number of ground-based sites in the table.
    pub fn ground_based_count(&self) -> usize {
        self.sites.iter().filter(|s| s.is_ground_based()).count()
    }
}
