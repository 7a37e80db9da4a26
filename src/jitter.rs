//! # Search jitter
//!
//! Pseudo-random sequence used to offset the sample point of every angle bisection step, so
//! that adjacent distances do not probe the same angles and miss thin population bins.
//!
//! The generator is a multiplicative linear congruential generator with multiplier `13^13`
//! and modulus `2^59`. It is cheap, has a long enough period for a single tracklet search, and
//! is fully reproducible from its seed.
//!
//! ## See also
//! ------------
//! * [`crate::ranging`] – consumes [`JitterRng::next_unit`] during angle bisection.
//! * [`crate::constants::REPEATABLE_SEED`] – seed used in repeatable mode.

use rand::RngCore;

use crate::constants::REPEATABLE_SEED;

/// 13^13
const MULTIPLIER: u64 = 302_875_106_592_253;

/// 2^59 - 1
const MASK: u64 = (1 << 59) - 1;

/// 1 / 2^59
const INV_MODULUS: f64 = 1.0 / (1u64 << 59) as f64;

/// Per-worker jitter generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitterRng {
    state: u64,
}

impl JitterRng {
    /// Generator starting from `seed`.
    ///
    /// A multiplicative generator needs an odd state: even seeds are made odd.
    pub fn new(seed: u64) -> Self {
        JitterRng {
            state: (seed | 1) & MASK,
        }
    }

    /// Generator in the fixed state used by repeatable runs.
    pub fn repeatable() -> Self {
        Self::new(REPEATABLE_SEED)
    }

    /// Generator seeded from another random source, typically `rand::rng()`.
    pub fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.next_u64())
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Next value of the sequence, uniform in `[0, 1)`.
    #[inline]
    pub fn next_unit(&mut self) -> f64 {
        self.step() as f64 * INV_MODULUS
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(MULTIPLIER) & MASK;
        self.state
    }
}

impl RngCore for JitterRng {
    fn next_u32(&mut self) -> u32 {
        // high bits of an LCG are the most random
        (self.step() >> 27) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
