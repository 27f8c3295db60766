//! Weak handles over idle instances

use std::fmt;
use std::sync::{Arc, Weak};

use crossbeam::queue::SegQueue;
use parking_lot::Mutex;

/// Identity of one admission into the idle set. Monotonic, never reused, so
/// lower ids always mean earlier admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct HandleId(u64);

impl HandleId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Queue on which cells report their death. Shared by the pool and every
/// cell it admits.
pub(crate) type ReclaimQueue = SegQueue<HandleId>;

/// Strong owner of one idle instance.
///
/// Exactly one cell exists per admission. The instance stays alive while
/// someone holds the cell's `Arc`; when the last strong reference drops with
/// the value still inside, the cell reports its id on the reclaim queue.
/// Taking the value out first ([`sever`](SoftCell::sever)) disarms that
/// report, so a severed instance is never reported reclaimed.
pub(crate) struct SoftCell<T> {
    id: HandleId,
    value: Mutex<Option<T>>,
    reclaimed: Arc<ReclaimQueue>,
}

impl<T> SoftCell<T> {
    pub(crate) fn new(id: HandleId, value: T, reclaimed: Arc<ReclaimQueue>) -> Self {
        Self {
            id,
            value: Mutex::new(Some(value)),
            reclaimed,
        }
    }

    pub(crate) fn id(&self) -> HandleId {
        self.id
    }

    /// Takes the instance out, disarming the death report.
    pub(crate) fn sever(&self) -> Option<T> {
        self.value.lock().take()
    }
}

impl<T> Drop for SoftCell<T> {
    fn drop(&mut self) {
        if self.value.get_mut().is_some() {
            self.reclaimed.push(self.id);
        }
    }
}

/// What the idle set actually stores: an id plus a reference that cannot by
/// itself keep the instance alive.
pub(crate) struct SoftHandle<T> {
    id: HandleId,
    referent: Weak<SoftCell<T>>,
}

impl<T> SoftHandle<T> {
    pub(crate) fn new(id: HandleId, referent: Weak<SoftCell<T>>) -> Self {
        Self { id, referent }
    }

    pub(crate) fn id(&self) -> HandleId {
        self.id
    }

    /// Upgrades to the cell if the instance is still resident. Consumes the
    /// handle; a handle is never resolved twice.
    pub(crate) fn resolve(self) -> Option<Arc<SoftCell<T>>> {
        self.referent.upgrade()
    }
}
