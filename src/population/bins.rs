//! Partition of the (q, e, i, H) space into population bins.
//!
//! Each partition lists the upper boundary of every bin. A value equal to a boundary belongs
//! to the next bin. `q`, `e` and `i` at or beyond their last boundary are outside the model;
//! `H` beyond its last boundary stays in the last bin since faint objects are open-ended.

/// Upper boundaries of the perihelion distance bins (AU)
pub const Q_PARTITION: [f64; 29] = [
    0.4, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.67, 1.8, 2.0, 2.2, 2.4, 2.6, 2.8, 3.0, 3.2,
    3.5, 4.0, 4.5, 5.0, 5.5, 10.0, 20.0, 30.0, 40.0, 100.0,
];

/// Upper boundaries of the eccentricity bins
pub const E_PARTITION: [f64; 8] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.9, 1.1];

/// Upper boundaries of the inclination bins (degrees)
pub const I_PARTITION: [f64; 11] = [2.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 60.0, 90.0, 180.0];

/// Upper boundaries of the absolute magnitude bins
pub const H_PARTITION: [f64; 18] = [
    6.0, 8.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0,
    24.0, 25.5,
];

pub const QX: usize = Q_PARTITION.len();
pub const EX: usize = E_PARTITION.len();
pub const IX: usize = I_PARTITION.len();
pub const HX: usize = H_PARTITION.len();

/// Number of (q, e, i) cells
pub const QEI_COUNT: usize = QX * EX * IX;

/// Number of (q, e, i, H) bins
pub const BIN_COUNT: usize = QEI_COUNT * HX;

/// Coordinates of one population bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinIndex {
    pub q: usize,
    pub e: usize,
    pub i: usize,
    pub h: usize,
}

impl BinIndex {
    /// Offset of the bin in a flattened `[q][e][i][H]` array.
    #[inline]
    pub fn flat(&self) -> usize {
        ((self.q * EX + self.e) * IX + self.i) * HX + self.h
    }

    /// Inverse of [`BinIndex::flat`].
    pub fn from_flat(flat: usize) -> Self {
        let h = flat % HX;
        let qei = flat / HX;
        BinIndex {
            q: qei / (EX * IX),
            e: (qei / IX) % EX,
            i: qei % IX,
            h,
        }
    }

    /// Every bin, in flattened order.
    pub fn iter_all() -> impl Iterator<Item = BinIndex> {
        (0..BIN_COUNT).map(BinIndex::from_flat)
    }
}

/// Index of the bin holding `value`, or `None` when `value` is at or beyond the last boundary.
///
/// NaN is never below a boundary, so it is reported as out of range.
#[inline]
pub fn partition_index(value: f64, partition: &[f64]) -> Option<usize> {
    partition.iter().position(|&bound| value < bound)
}

/// Bin of an absolute magnitude. Values beyond the last boundary go to the last bin, NaN goes
/// to the first one.
#[inline]
pub fn h_bin(h: f64) -> usize {
    H_PARTITION[..HX - 1]
        .iter()
        .position(|&bound| !(h >= bound))
        .unwrap_or(HX - 1)
}

/// Bin of an orbit, or `None` when (q, e, i) lies outside the model.
#[inline]
pub fn bin_index(q: f64, e: f64, i: f64, h: f64) -> Option<BinIndex> {
    qei_bin(q, e, i, h_bin(h))
}

/// Same as [`bin_index`], with the H bin already known.
#[inline]
pub fn qei_bin(q: f64, e: f64, i: f64, h_bin: usize) -> Option<BinIndex> {
    Some(BinIndex {
        q: partition_index(q, &Q_PARTITION)?,
        e: partition_index(e, &E_PARTITION)?,
        i: partition_index(i, &I_PARTITION)?,
        h: h_bin,
    })
}
