//! Fixed pool of reusable tracklet buffers.
//!
//! Every buffer keeps the capacity of its observation storage across uses. A buffer leaves the
//! pool as a [`PooledTracklet`] that remembers its slot; releasing it checks that the slot is
//! really checked out of this pool. A closed pool lends nothing more but still takes buffers
//! back.

use parking_lot::{Condvar, Mutex};

use crate::{
    observations::{Observation, Tracklet},
    pipeline::{LockDomain, LockDomainGuard},
};

/// A tracklet buffer checked out of a [`BufferPool`].
#[derive(Debug)]
pub struct PooledTracklet {
    slot: usize,
    pub tracklet: Tracklet,
}

impl PooledTracklet {
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Overwrite the buffer with a copy of `designation` and `observations`.
    pub fn fill<'a>(
        &mut self,
        designation: &str,
        observations: impl IntoIterator<Item = &'a Observation>,
    ) {
        self.tracklet.designation.clear();
        self.tracklet.designation.push_str(designation);
        self.tracklet.observations.clear();
        self.tracklet
            .observations
            .extend(observations.into_iter().cloned());
    }
}

#[derive(Debug)]
struct PoolState {
    free: Vec<PooledTracklet>,
    checked_out: Vec<bool>,
    closed: bool,
}

/// Pool of `n` tracklet buffers.
#[derive(Debug)]
pub struct BufferPool {
    state: Mutex<PoolState>,
    available: Condvar,
}

impl BufferPool {
    pub fn new(n: usize) -> Self {
        let free = (0..n)
            .rev()
            .map(|slot| PooledTracklet {
                slot,
                tracklet: Tracklet::default(),
            })
            .collect();
        BufferPool {
            state: Mutex::new(PoolState {
                free,
                checked_out: vec![false; n],
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Total number of buffers.
    pub fn capacity(&self) -> usize {
        let _domain = LockDomainGuard::enter(LockDomain::Pool);
        self.state.lock().checked_out.len()
    }

    /// Number of buffers currently in the pool.
    pub fn available(&self) -> usize {
        let _domain = LockDomainGuard::enter(LockDomain::Pool);
        self.state.lock().free.len()
    }

    /// Take a buffer, waiting for one to be released if the pool is empty.
    ///
    /// Return
    /// ----------
    /// * `None` once the pool is closed, including while waiting.
    pub fn acquire(&self) -> Option<PooledTracklet> {
        let _domain = LockDomainGuard::enter(LockDomain::Pool);
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(buffer) = state.free.pop() {
                state.checked_out[buffer.slot] = true;
                return Some(buffer);
            }
            self.available.wait(&mut state);
        }
    }

    /// Stop lending buffers and wake every waiting borrower.
    pub fn close(&self) {
        let _domain = LockDomainGuard::enter(LockDomain::Pool);
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Return a buffer to the pool.
    ///
    /// Panics if the buffer was not checked out of this pool: the ownership of buffers is
    /// broken and no result produced from them can be trusted.
    pub fn release(&self, buffer: PooledTracklet) {
        let _domain = LockDomainGuard::enter(LockDomain::Pool);
        let mut state = self.state.lock();
        match state.checked_out.get_mut(buffer.slot) {
            Some(out) if *out => *out = false,
            _ => panic!(
                "buffer slot {} released to a pool that did not lend it",
                buffer.slot
            ),
        }
        state.free.push(buffer);
        self.available.notify_one();
    }
}
