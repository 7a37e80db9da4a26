//! # Population model
//!
//! Four-dimensional histograms of the solar-system population over (q, e, i, H) bins, used as
//! the prior weighting the orbits reachable from a tracklet.
//!
//! ## Overview
//!
//! - `all`: the whole synthetic population, and `unknown`: the part of it not yet cataloged.
//! - The same pair of histograms restricted to each [`OrbitClass`], in catalog order.
//!
//! The model is built once (see [`PopulationModel::from_csv_reader`] or
//! [`PopulationModel::from_fn`]) and is immutable afterwards: any number of workers may read it
//! concurrently through a shared reference.
//!
//! ## See also
//! ------------
//! * [`bins`] – partitions and bin mapping.
//! * [`crate::ranging`] – accumulates the model over the bins reached by a tracklet.

pub mod bins;
mod csv_reader;

use bins::{BinIndex, BIN_COUNT};

use crate::{digest_errors::DigestError, orbit_class::OrbitClass};

/// Population of one bin, overall and restricted to one class.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinPopulation {
    pub all: f64,
    pub unknown: f64,
    pub all_in_class: f64,
    pub unknown_in_class: f64,
}

/// Population mass of one bin, used to build models.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinMass {
    pub all: f64,
    pub unknown: f64,
}

#[derive(Debug, Clone)]
struct Histograms {
    all: Box<[f64]>,
    unknown: Box<[f64]>,
}

impl Histograms {
    fn zeroed() -> Self {
        Histograms {
            all: vec![0.0; BIN_COUNT].into_boxed_slice(),
            unknown: vec![0.0; BIN_COUNT].into_boxed_slice(),
        }
    }

    fn from_vecs(all: Vec<f64>, unknown: Vec<f64>, what: &str) -> Result<Self, DigestError> {
        for (name, v) in [("all", &all), ("unknown", &unknown)] {
            if v.len() != BIN_COUNT {
                return Err(DigestError::InvalidModelShape(format!(
                    "{what}/{name}: expected {BIN_COUNT} bins, got {}",
                    v.len()
                )));
            }
        }
        Ok(Histograms {
            all: all.into_boxed_slice(),
            unknown: unknown.into_boxed_slice(),
        })
    }
}

/// Read-only population model.
#[derive(Debug, Clone)]
pub struct PopulationModel {
    solar_system: Histograms,
    classes: Vec<Histograms>,
}

impl PopulationModel {
    /// Build a model from flattened `[q][e][i][H]` arrays.
    ///
    /// Arguments
    /// ---------
    /// * `all`, `unknown`: whole-population histograms
    /// * `classes`: one `(all, unknown)` pair per class, in catalog order
    ///
    /// Return
    /// ----------
    /// * The model, or [`DigestError::InvalidModelShape`] when an array has the wrong length or
    ///   the number of class pairs differs from the catalog size.
    pub fn from_arrays(
        all: Vec<f64>,
        unknown: Vec<f64>,
        classes: Vec<(Vec<f64>, Vec<f64>)>,
    ) -> Result<Self, DigestError> {
        if classes.len() != OrbitClass::COUNT {
            return Err(DigestError::InvalidModelShape(format!(
                "expected {} class histograms, got {}",
                OrbitClass::COUNT,
                classes.len()
            )));
        }
        let solar_system = Histograms::from_vecs(all, unknown, "SS")?;
        let classes = classes
            .into_iter()
            .zip(OrbitClass::ALL)
            .map(|((a, u), c)| Histograms::from_vecs(a, u, c.abbreviation()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PopulationModel {
            solar_system,
            classes,
        })
    }

    /// Build a model by evaluating the population of every bin.
    ///
    /// Arguments
    /// ---------
    /// * `population`: mass of the whole population in a bin
    /// * `class_population`: mass of a class in a bin
    pub fn from_fn(
        mut population: impl FnMut(BinIndex) -> BinMass,
        mut class_population: impl FnMut(OrbitClass, BinIndex) -> BinMass,
    ) -> Self {
        let mut solar_system = Histograms::zeroed();
        let mut classes: Vec<Histograms> = (0..OrbitClass::COUNT).map(|_| Histograms::zeroed()).collect();

        for bin in BinIndex::iter_all() {
            let flat = bin.flat();
            let mass = population(bin);
            solar_system.all[flat] = mass.all;
            solar_system.unknown[flat] = mass.unknown;

            for (class, hist) in OrbitClass::ALL.into_iter().zip(classes.iter_mut()) {
                let mass = class_population(class, bin);
                hist.all[flat] = mass.all;
                hist.unknown[flat] = mass.unknown;
            }
        }
        PopulationModel {
            solar_system,
            classes,
        }
    }

    /// Population of one bin, overall and restricted to `class`.
    pub fn lookup(&self, bin: BinIndex, class: OrbitClass) -> BinPopulation {
        self.lookup_flat(bin.flat(), class)
    }

    #[inline]
    pub(crate) fn lookup_flat(&self, flat: usize, class: OrbitClass) -> BinPopulation {
        let hist = &self.classes[class.index()];
        BinPopulation {
            all: self.solar_system.all[flat],
            unknown: self.solar_system.unknown[flat],
            all_in_class: hist.all[flat],
            unknown_in_class: hist.unknown[flat],
        }
    }

    /// Total mass of the whole population.
    pub fn total_population(&self) -> BinMass {
        BinMass {
            all: self.solar_system.all.iter().sum(),
            unknown: self.solar_system.unknown.iter().sum(),
        }
    }
}

#[cfg(test)]
mod population_test {
    use super::*;

    #[test]
    fn test_from_fn_and_lookup() {
        let model = PopulationModel::from_fn(
            |bin| BinMass {
                all: (bin.q + 1) as f64,
                unknown: bin.h as f64,
            },
            |class, bin| BinMass {
                all: if class == OrbitClass::Neo && bin.q < 8 { 1.0 } else { 0.0 },
                unknown: 0.5,
            },
        );

        let bin = BinIndex {
            q: 3,
            e: 2,
            i: 1,
            h: 9,
        };
        let pop = model.lookup(bin, OrbitClass::Neo);
        assert_eq!(
            pop,
            BinPopulation {
                all: 4.0,
                unknown: 9.0,
                all_in_class: 1.0,
                unknown_in_class: 0.5
            }
        );
        assert_eq!(model.lookup(bin, OrbitClass::Hilda).all_in_class, 0.0);
        assert_eq!(
            model.total_population().unknown,
            (0..18).sum::<usize>() as f64 * (bins::QEI_COUNT as f64)
        );
    }

    #[test]
    fn test_from_arrays_shape() {
        let ok = PopulationModel::from_arrays(
            vec![1.0; BIN_COUNT],
            vec![0.5; BIN_COUNT],
            vec![(vec![0.0; BIN_COUNT], vec![0.0; BIN_COUNT]); OrbitClass::COUNT],
        );
        assert!(ok.is_ok());

        let missing_class = PopulationModel::from_arrays(
            vec![1.0; BIN_COUNT],
            vec![0.5; BIN_COUNT],
            vec![(vec![0.0; BIN_COUNT], vec![0.0; BIN_COUNT]); 3],
        );
        assert!(matches!(
            missing_class,
            Err(DigestError::InvalidModelShape(_))
        ));

        let short = PopulationModel::from_arrays(
            vec![1.0; 10],
            vec![0.5; BIN_COUNT],
            vec![(vec![0.0; BIN_COUNT], vec![0.0; BIN_COUNT]); OrbitClass::COUNT],
        );
        assert_eq!(
            short.err(),
            Some(DigestError::InvalidModelShape(format!(
                "SS/all: expected {BIN_COUNT} bins, got 10"
            )))
        );
    }
}
