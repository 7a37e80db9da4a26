#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use smallvec::smallvec;
use tracing_subscriber::EnvFilter;
use tracklet_digest::{
    constants::{Observations, RADEG},
    conversion::parse_obscode,
    observations::{Observation, Tracklet},
    observers::{Site, SiteTable},
    orbit_class::OrbitClass,
    population::{
        bins::{BinIndex, E_PARTITION, H_PARTITION, I_PARTITION, Q_PARTITION},
        BinMass, PopulationModel,
    },
};

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Lower and upper boundary of bin `k` of a partition starting at zero.
fn bounds(partition: &[f64], k: usize) -> (f64, f64) {
    let lo = if k == 0 { 0.0 } else { partition[k - 1] };
    (lo, partition[k])
}

/// Center of bin `k` of a partition starting at zero.
pub fn midpoint(partition: &[f64], k: usize) -> f64 {
    let (lo, hi) = bounds(partition, k);
    (lo + hi) / 2.0
}

/// Three evenly spread sample values inside bin `k`.
fn samples(partition: &[f64], k: usize) -> [f64; 3] {
    let (lo, hi) = bounds(partition, k);
    std::array::from_fn(|j| lo + (j as f64 + 0.5) / 3.0 * (hi - lo))
}

/// Overdense groups of the reference population: member classes, total and undiscovered
/// density on top of the background.
const GROUPS: [(&[OrbitClass], f64, f64); 3] = [
    (
        &[
            OrbitClass::InnerMainBelt,
            OrbitClass::MiddleMainBelt,
            OrbitClass::OuterMainBelt,
        ],
        100.0,
        10.0,
    ),
    (&[OrbitClass::Hilda], 300.0, 60.0),
    (&[OrbitClass::JupiterTrojan], 1000.0, 500.0),
];

/// Population density at one orbit: a flat background that is half undiscovered, plus the
/// mostly cataloged main belt and the largely undiscovered Hilda and Trojan groups.
fn density(q: f64, e: f64, i: f64, h: f64) -> BinMass {
    let mut mass = BinMass {
        all: 1.0,
        unknown: 0.5,
    };
    for (classes, all, unknown) in GROUPS {
        if classes.iter().any(|class| class.contains(q, e, i, h)) {
            mass.all += all;
            mass.unknown += unknown;
        }
    }
    mass
}

/// Mass of one bin and of every class inside it, integrated over 27 sample orbits.
fn bin_masses(bin: BinIndex) -> (BinMass, [BinMass; OrbitClass::COUNT]) {
    let h = midpoint(&H_PARTITION, bin.h);
    let mut total = BinMass::default();
    let mut classes = [BinMass::default(); OrbitClass::COUNT];

    for q in samples(&Q_PARTITION, bin.q) {
        for e in samples(&E_PARTITION, bin.e) {
            for i in samples(&I_PARTITION, bin.i) {
                let mass = density(q, e, i, h);
                total.all += mass.all / 27.0;
                total.unknown += mass.unknown / 27.0;
                for class in OrbitClass::ALL {
                    if class.contains(q, e, i, h) {
                        classes[class.index()].all += mass.all / 27.0;
                        classes[class.index()].unknown += mass.unknown / 27.0;
                    }
                }
            }
        }
    }
    (total, classes)
}

/// Reference population built from [`density`], shared by every test of a binary.
pub fn belt_model() -> Arc<PopulationModel> {
    static MODEL: OnceLock<Arc<PopulationModel>> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            let table: Vec<_> = BinIndex::iter_all().map(bin_masses).collect();
            Arc::new(PopulationModel::from_fn(
                |bin| table[bin.flat()].0,
                |class, bin| table[bin.flat()].1[class.index()],
            ))
        })
        .clone()
}

/// Population with no mass anywhere.
pub fn empty_model() -> PopulationModel {
    PopulationModel::from_fn(|_| BinMass::default(), |_, _| BinMass::default())
}

pub fn g96() -> Site {
    Site::from_parallax(249.21128, 0.845111, 0.533614, Some("Mt. Lemmon Survey".into()))
}

/// Site table holding the Mt. Lemmon survey (G96) and the geocenter (500).
pub fn site_table() -> SiteTable {
    let mut sites = SiteTable::new();
    sites.insert(parse_obscode("G96").unwrap(), g96()).unwrap();
    sites
        .insert(
            parse_obscode("500").unwrap(),
            Site::from_parallax(0.0, 0.0, 0.0, Some("Geocentric".into())),
        )
        .unwrap();
    sites
}

/// Near-Earth object moving 0.5° in one hour, seen from G96.
pub fn fast_mover(designation: &str) -> Tracklet {
    let t0 = 60200.25;
    let obs: Observations = smallvec![
        Observation::from_obscode("G96", t0, 300.0 * RADEG, -10.0 * RADEG).unwrap(),
        Observation::from_obscode("G96", t0 + 1.0 / 24.0, 300.0 * RADEG, -9.5 * RADEG).unwrap(),
    ];
    Tracklet::new(designation, obs)
}

/// Object at opposition drifting 0.25°/day retrograde along the ecliptic, seen from G96
/// an hour apart: the typical motion of a main-belt asteroid.
pub fn slow_mover(designation: &str) -> Tracklet {
    let t0 = 60200.3;
    let obs: Observations = smallvec![
        Observation::from_obscode("G96", t0, 6.126895215314735, -0.06737141435039273)
            .unwrap()
            .with_magnitude(19.0),
        Observation::from_obscode("G96", t0 + 0.04, 6.126734350554344, -0.0674399830598328)
            .unwrap()
            .with_magnitude(19.0),
    ];
    Tracklet::new(designation, obs)
}

/// Jupiter Trojan at opposition drifting 0.13°/day retrograde along the ecliptic, seen from
/// G96 an hour apart.
pub fn trojan_mover(designation: &str) -> Tracklet {
    let t0 = 60200.3;
    let obs: Observations = smallvec![
        Observation::from_obscode("G96", t0, 6.126895215314735, -0.06737141435039273)
            .unwrap()
            .with_magnitude(19.0),
        Observation::from_obscode("G96", t0 + 0.04, 6.126811565817152, -0.06740707027755376)
            .unwrap()
            .with_magnitude(19.0),
    ];
    Tracklet::new(designation, obs)
}

/// A tracklet with a single observation, never scorable.
pub fn single_observation(designation: &str) -> Tracklet {
    let obs: Observations = smallvec![Observation::from_obscode(
        "G96",
        60200.25,
        300.0 * RADEG,
        -10.0 * RADEG
    )
    .unwrap()];
    Tracklet::new(designation, obs)
}
