//! # Orbit classes
//!
//! The fixed catalog of orbit families scored by the engine. Each class is a predicate over
//! perihelion distance `q` (AU), eccentricity `e`, inclination `i` (degrees) and absolute
//! magnitude `H`.
//!
//! The catalog order is significant: the population model stores one pair of class histograms
//! per class in this order.

use std::str::FromStr;

use serde::Serialize;

use crate::{constants::RADEG, digest_errors::DigestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OrbitClass {
    /// Orbits of interest to the MPC: NEOs, high e or i, or a distant aphelion
    MpcInterest,
    /// q < 1.3
    Neo,
    /// NEO with H <= 22
    NeoH22,
    /// NEO with H <= 18
    NeoH18,
    MarsCrosser,
    Hungaria,
    Phocaea,
    InnerMainBelt,
    Pallas,
    Hansa,
    MiddleMainBelt,
    OuterMainBelt,
    Hilda,
    JupiterTrojan,
    JupiterFamilyComet,
}

impl OrbitClass {
    /// Number of classes in the catalog
    pub const COUNT: usize = 15;

    /// Every class, in catalog order
    pub const ALL: [OrbitClass; Self::COUNT] = [
        OrbitClass::MpcInterest,
        OrbitClass::Neo,
        OrbitClass::NeoH22,
        OrbitClass::NeoH18,
        OrbitClass::MarsCrosser,
        OrbitClass::Hungaria,
        OrbitClass::Phocaea,
        OrbitClass::InnerMainBelt,
        OrbitClass::Pallas,
        OrbitClass::Hansa,
        OrbitClass::MiddleMainBelt,
        OrbitClass::OuterMainBelt,
        OrbitClass::Hilda,
        OrbitClass::JupiterTrojan,
        OrbitClass::JupiterFamilyComet,
    ];

    /// Position of the class in the catalog.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Three-letter abbreviation, as used in population model files and configuration.
    pub fn abbreviation(self) -> &'static str {
        match self {
            OrbitClass::MpcInterest => "Int",
            OrbitClass::Neo => "NEO",
            OrbitClass::NeoH22 => "N22",
            OrbitClass::NeoH18 => "N18",
            OrbitClass::MarsCrosser => "MC",
            OrbitClass::Hungaria => "Hun",
            OrbitClass::Phocaea => "Pho",
            OrbitClass::InnerMainBelt => "MB1",
            OrbitClass::Pallas => "Pal",
            OrbitClass::Hansa => "Han",
            OrbitClass::MiddleMainBelt => "MB2",
            OrbitClass::OuterMainBelt => "MB3",
            OrbitClass::Hilda => "Hil",
            OrbitClass::JupiterTrojan => "JTr",
            OrbitClass::JupiterFamilyComet => "JFC",
        }
    }

    /// Column heading for tabular reports.
    pub fn heading(self) -> &'static str {
        match self {
            OrbitClass::MpcInterest => "MPC interest.",
            OrbitClass::Neo => "NEO(q < 1.3)",
            OrbitClass::NeoH22 => "NEO(H <= 22)",
            OrbitClass::NeoH18 => "NEO(H <= 18)",
            OrbitClass::MarsCrosser => "Mars Crosser",
            OrbitClass::Hungaria => "Hungaria gr.",
            OrbitClass::Phocaea => "Phocaea group",
            OrbitClass::InnerMainBelt => "Inner MB",
            OrbitClass::Pallas => "Pallas group",
            OrbitClass::Hansa => "Hansa group",
            OrbitClass::MiddleMainBelt => "Middle MB",
            OrbitClass::OuterMainBelt => "Outer MB",
            OrbitClass::Hilda => "Hilda group",
            OrbitClass::JupiterTrojan => "Jupiter tr.",
            OrbitClass::JupiterFamilyComet => "Jupiter Comet",
        }
    }

    /// Score reported when a search reaches no population mass at all for this class.
    ///
    /// The two broad classes default to certainty, every narrower class to zero.
    #[inline]
    pub fn empty_score(self) -> f64 {
        match self {
            OrbitClass::MpcInterest | OrbitClass::Neo => 100.0,
            _ => 0.0,
        }
    }

    /// Test whether an orbit belongs to the class.
    ///
    /// Arguments
    /// ---------
    /// * `q`: perihelion distance (AU)
    /// * `e`: eccentricity
    /// * `i`: inclination (degrees)
    /// * `h`: absolute magnitude
    pub fn contains(self, q: f64, e: f64, i: f64, h: f64) -> bool {
        let a = q / (1.0 - e);
        let aphelion = q * (1.0 + e) / (1.0 - e);
        match self {
            OrbitClass::MpcInterest => q < 1.3 || e >= 0.5 || i >= 40.0 || aphelion > 10.0,
            OrbitClass::Neo => q < 1.3,
            OrbitClass::NeoH22 => q < 1.3 && h < 22.5,
            OrbitClass::NeoH18 => q < 1.3 && h < 18.5,
            OrbitClass::MarsCrosser => (1.3..1.67).contains(&q) && aphelion > 1.58,
            OrbitClass::Hungaria => {
                !(e > 0.18 || !(16.0..=34.0).contains(&i)) && a > 1.78 && a < 2.0
            }
            OrbitClass::Phocaea => {
                !(q < 1.5 || !(20.0..=27.0).contains(&i)) && a > 2.2 && a < 2.45
            }
            OrbitClass::InnerMainBelt => {
                q >= 1.67 && a > 2.1 && a < 2.5 && i < (a - 2.1) / 0.4 * 10.0 + 7.0
            }
            OrbitClass::Pallas => {
                !(e > 0.35 || !(24.0..=37.0).contains(&i)) && a > 2.5 && a < 2.8
            }
            OrbitClass::Hansa => {
                !(e > 0.25 || !(20.0..=23.5).contains(&i)) && a > 2.55 && a < 2.72
            }
            OrbitClass::MiddleMainBelt => e <= 0.45 && i <= 20.0 && a > 2.5 && a < 2.8,
            OrbitClass::OuterMainBelt => {
                e <= 0.4 && a > 2.8 && a < 3.25 && i < (a - 2.8) / 0.45 * 16.0 + 20.0
            }
            OrbitClass::Hilda => i <= 18.0 && e <= 0.4 && a > 3.9 && a < 4.02,
            OrbitClass::JupiterTrojan => e <= 0.22 && i <= 38.0 && a > 5.05 && a < 5.35,
            OrbitClass::JupiterFamilyComet => {
                if q < 1.3 {
                    return false;
                }
                let tisserand =
                    5.2 * (1.0 - e) / q + 2.0 * (q * (1.0 + e) / 5.2).sqrt() * (i * RADEG).cos();
                tisserand > 2.0 && tisserand < 3.0
            }
        }
    }
}

impl std::fmt::Display for OrbitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for OrbitClass {
    type Err = DigestError;

    /// Parse a class from its abbreviation (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrbitClass::ALL
            .into_iter()
            .find(|c| c.abbreviation().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DigestError::UnknownOrbitClass(s.to_string()))
    }
}

#[cfg(test)]
mod orbit_class_test {
    use super::*;

    #[test]
    fn test_catalog_order() {
        for (idx, class) in OrbitClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), idx);
        }
        assert_eq!(OrbitClass::ALL[7].abbreviation(), "MB1");
        assert_eq!(OrbitClass::ALL[14].heading(), "Jupiter Comet");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("MB3".parse::<OrbitClass>(), Ok(OrbitClass::OuterMainBelt));
        assert_eq!("neo".parse::<OrbitClass>(), Ok(OrbitClass::Neo));
        assert_eq!(
            "XYZ".parse::<OrbitClass>(),
            Err(DigestError::UnknownOrbitClass("XYZ".into()))
        );
        for class in OrbitClass::ALL {
            assert_eq!(class.to_string().parse::<OrbitClass>(), Ok(class));
        }
    }

    #[test]
    fn test_empty_score() {
        assert_eq!(OrbitClass::MpcInterest.empty_score(), 100.0);
        assert_eq!(OrbitClass::Neo.empty_score(), 100.0);
        for class in &OrbitClass::ALL[2..] {
            assert_eq!(class.empty_score(), 0.0);
        }
    }

    #[test]
    fn test_predicates() {
        use OrbitClass::*;

        // A typical Apollo
        assert!(Neo.contains(0.8, 0.5, 10.0, 20.0));
        assert!(MpcInterest.contains(0.8, 0.5, 10.0, 20.0));
        assert!(NeoH22.contains(0.8, 0.5, 10.0, 22.4));
        assert!(!NeoH22.contains(0.8, 0.5, 10.0, 22.5));
        assert!(!NeoH18.contains(0.8, 0.5, 10.0, 20.0));

        // Ceres-like orbit: middle/outer belt boundary
        let (q, e) = (2.55, 0.08);
        assert!(!Neo.contains(q, e, 10.6, 3.3));
        assert!(!MpcInterest.contains(q, e, 10.6, 3.3));
        assert!(MiddleMainBelt.contains(q, e, 10.6, 3.3));
        assert!(!OuterMainBelt.contains(q, e, 10.6, 3.3));

        // Outer belt
        assert!(OuterMainBelt.contains(2.9, 0.05, 5.0, 15.0));
        assert!(!OuterMainBelt.contains(2.9, 0.05, 40.0, 15.0));

        // Hungaria: a ≈ 1.94, moderately inclined
        assert!(Hungaria.contains(1.8, 0.07, 22.0, 16.0));
        assert!(!Hungaria.contains(1.8, 0.07, 10.0, 16.0));

        // Mars crosser
        assert!(MarsCrosser.contains(1.5, 0.2, 5.0, 17.0));
        assert!(!MarsCrosser.contains(1.2, 0.2, 5.0, 17.0));

        // Jupiter trojan
        assert!(JupiterTrojan.contains(4.9, 0.05, 10.0, 12.0));
        assert!(!JupiterTrojan.contains(4.9, 0.3, 10.0, 12.0));

        // Hilda: a ≈ 3.96
        assert!(Hilda.contains(3.2, 0.19, 8.0, 14.0));

        // Comet 67P-like: q = 1.24 is excluded by the q >= 1.3 rule, q = 1.35 is in
        assert!(!JupiterFamilyComet.contains(1.24, 0.64, 7.0, 15.0));
        assert!(JupiterFamilyComet.contains(1.35, 0.62, 7.0, 15.0));

        // High-inclination orbit is of MPC interest
        assert!(MpcInterest.contains(2.0, 0.1, 45.0, 15.0));
    }
}
