//! Bin tags and population tallies of one tracklet search.
//!
//! Two levels of tags are kept per class:
//!
//! * *distance tags* (`d_in`, `d_out`) record the bins reached at the distance currently being
//!   searched. They are cleared before every distance.
//! * *tracklet tags* (`tag_in`, `tag_out`) record the bins already added to the class tally, so
//!   that every bin contributes at most once per side.
//!
//! Distance tags are cleared through the list of bins touched at that distance instead of
//! wiping the whole bitmaps.

use crate::{
    orbit_class::OrbitClass,
    population::{bins::BIN_COUNT, PopulationModel},
};

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = BIN_COUNT.div_ceil(WORD_BITS);

/// Fixed-size bit set over every population bin.
#[derive(Clone)]
pub(crate) struct BinSet {
    words: Box<[u64]>,
}

impl std::fmt::Debug for BinSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinSet").field("len", &self.len()).finish()
    }
}

impl BinSet {
    pub(crate) fn new() -> Self {
        BinSet {
            words: vec![0; WORDS].into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, bin: usize) -> bool {
        self.words[bin / WORD_BITS] & (1 << (bin % WORD_BITS)) != 0
    }

    /// Set `bin`, returning `true` if it was not set before.
    #[inline]
    pub(crate) fn insert(&mut self, bin: usize) -> bool {
        let word = &mut self.words[bin / WORD_BITS];
        let mask = 1 << (bin % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    #[inline]
    pub(crate) fn remove(&mut self, bin: usize) {
        self.words[bin / WORD_BITS] &= !(1 << (bin % WORD_BITS));
    }

    pub(crate) fn clear(&mut self) {
        self.words.fill(0);
    }

    pub(crate) fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Running sums of population mass for one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassTally {
    pub class: OrbitClass,
    pub all_in: f64,
    pub unknown_in: f64,
    pub all_out: f64,
    pub unknown_out: f64,
}

impl ClassTally {
    pub fn new(class: OrbitClass) -> Self {
        ClassTally {
            class,
            all_in: 0.0,
            unknown_in: 0.0,
            all_out: 0.0,
            unknown_out: 0.0,
        }
    }

    /// Percentage of the reached population belonging to the class.
    pub fn raw_score(&self) -> f64 {
        percentage(self.all_in, self.all_out, self.class)
    }

    /// Same as [`ClassTally::raw_score`], restricted to the uncataloged population.
    pub fn noid_score(&self) -> f64 {
        percentage(self.unknown_in, self.unknown_out, self.class)
    }
}

fn percentage(inside: f64, outside: f64, class: OrbitClass) -> f64 {
    let total = inside + outside;
    if total > 0.0 {
        100.0 * inside / total
    } else {
        class.empty_score()
    }
}

/// Tags of one class.
#[derive(Debug, Clone)]
struct ClassTags {
    tag_in: BinSet,
    tag_out: BinSet,
    d_in: BinSet,
    d_out: BinSet,
}

impl ClassTags {
    fn new() -> Self {
        ClassTags {
            tag_in: BinSet::new(),
            tag_out: BinSet::new(),
            d_in: BinSet::new(),
            d_out: BinSet::new(),
        }
    }
}

/// Tags and tallies for every configured class.
#[derive(Debug, Clone)]
pub(crate) struct TagState {
    classes: Vec<ClassTags>,
    d_tag: BinSet,
    touched: Vec<usize>,
    tallies: Vec<ClassTally>,
}

impl TagState {
    pub(crate) fn new(classes: &[OrbitClass]) -> Self {
        TagState {
            classes: classes.iter().map(|_| ClassTags::new()).collect(),
            d_tag: BinSet::new(),
            touched: Vec::with_capacity(256),
            tallies: classes.iter().copied().map(ClassTally::new).collect(),
        }
    }

    pub(crate) fn tallies(&self) -> &[ClassTally] {
        &self.tallies
    }

    /// Forget everything: tags of both levels and tallies.
    pub(crate) fn reset(&mut self) {
        for tags in &mut self.classes {
            tags.tag_in.clear();
            tags.tag_out.clear();
            tags.d_in.clear();
            tags.d_out.clear();
        }
        self.d_tag.clear();
        self.touched.clear();
        for tally in &mut self.tallies {
            *tally = ClassTally::new(tally.class);
        }
    }

    /// Clear the distance tags.
    pub(crate) fn clear_distance(&mut self) {
        for &bin in &self.touched {
            self.d_tag.remove(bin);
            for tags in &mut self.classes {
                tags.d_in.remove(bin);
                tags.d_out.remove(bin);
            }
        }
        self.touched.clear();
    }

    /// `true` when no bin has been tagged at the current distance.
    #[inline]
    pub(crate) fn distance_is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Tag one orbit at the current distance.
    ///
    /// Arguments
    /// ---------
    /// * `bin`: flat index of the orbit's bin
    /// * `membership`: whether the orbit belongs to the class at the same position in the
    ///   configured class list
    ///
    /// Return
    /// ----------
    /// * `true` if any class saw this bin, on either side, for the first time at this distance.
    pub(crate) fn tag(&mut self, bin: usize, membership: impl Iterator<Item = bool>) -> bool {
        let mut fresh = false;
        for (tags, inside) in self.classes.iter_mut().zip(membership) {
            fresh |= if inside {
                tags.d_in.insert(bin)
            } else {
                tags.d_out.insert(bin)
            };
        }
        if fresh && self.d_tag.insert(bin) {
            self.touched.push(bin);
        }
        fresh
    }

    /// Add the bins tagged at the current distance to the class tallies.
    ///
    /// A bin inside a class adds the class population; a bin outside adds the rest of the
    /// solar-system population of that bin. Bins already counted on the same side are skipped.
    ///
    /// Return
    /// ----------
    /// * `true` if any tally received a new bin.
    pub(crate) fn pool(&mut self, model: &PopulationModel) -> bool {
        let mut fresh = false;
        for &bin in &self.touched {
            for (tags, tally) in self.classes.iter_mut().zip(self.tallies.iter_mut()) {
                let inside = tags.d_in.contains(bin) && tags.tag_in.insert(bin);
                let outside = tags.d_out.contains(bin) && tags.tag_out.insert(bin);
                if !(inside || outside) {
                    continue;
                }
                fresh = true;
                let pop = model.lookup_flat(bin, tally.class);
                if inside {
                    tally.all_in += pop.all_in_class;
                    tally.unknown_in += pop.unknown_in_class;
                }
                if outside {
                    tally.all_out += pop.all - pop.all_in_class;
                    tally.unknown_out += pop.unknown - pop.unknown_in_class;
                }
            }
        }
        fresh
    }
}
