//! Single-slot handoff between the assembler and the workers.
//!
//! The assembler [`put`](Staging::put)s one item at a time and waits for the slot to be empty
//! before the next one; exactly one waiting worker [`take`](Staging::take)s it. Once the
//! assembler is done it [`close`](Staging::close)s the slot, which lets idle workers leave.

use parking_lot::{Condvar, Mutex};

use crate::pipeline::{LockDomain, LockDomainGuard};

#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    closed: bool,
}

/// One-item handoff slot.
#[derive(Debug)]
pub struct Staging<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
    free: Condvar,
}

impl<T> Default for Staging<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Staging<T> {
    pub fn new() -> Self {
        Staging {
            slot: Mutex::new(Slot {
                item: None,
                closed: false,
            }),
            ready: Condvar::new(),
            free: Condvar::new(),
        }
    }

    /// Place `item` in the slot, waiting for it to be emptied first.
    ///
    /// Return
    /// ----------
    /// * `Err(item)` if the slot was closed.
    pub fn put(&self, item: T) -> Result<(), T> {
        let _domain = LockDomainGuard::enter(LockDomain::Staging);
        let mut slot = self.slot.lock();
        while slot.item.is_some() && !slot.closed {
            self.free.wait(&mut slot);
        }
        if slot.closed {
            return Err(item);
        }
        slot.item = Some(item);
        self.ready.notify_one();
        Ok(())
    }

    /// Take the next item, waiting for one to be staged.
    ///
    /// Return
    /// ----------
    /// * `None` once the slot is closed and empty.
    pub fn take(&self) -> Option<T> {
        let _domain = LockDomainGuard::enter(LockDomain::Staging);
        let mut slot = self.slot.lock();
        loop {
            if let Some(item) = slot.item.take() {
                self.free.notify_one();
                return Some(item);
            }
            if slot.closed {
                return None;
            }
            self.ready.wait(&mut slot);
        }
    }

    /// Stop accepting items. An item already staged is still handed out.
    pub fn close(&self) {
        let _domain = LockDomainGuard::enter(LockDomain::Staging);
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.ready.notify_all();
        self.free.notify_all();
    }
}
