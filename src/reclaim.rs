//! Memory-pressure side of the pool

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::handle::{HandleId, SoftCell};

/// Host-facing release surface over a pool's idle instances.
///
/// The pool itself reaches its idle members only through weak handles; the
/// strong holds that keep them alive live here. A host that watches memory
/// pressure keeps a clone of the valve and releases holds when it wants
/// memory back. A released instance is dropped in place, without the
/// factory's `destroy`, and the pool forgets the matching handle the next
/// time it drains its reclaim queue.
///
/// All methods may be called concurrently with pool operations. A release
/// that races a borrow of the same instance simply loses: the borrow has
/// already re-secured the instance, and nothing is reported reclaimed.
pub struct PressureValve<T> {
    held: Arc<DashMap<HandleId, Arc<SoftCell<T>>>>,
}

impl<T> PressureValve<T> {
    pub(crate) fn new() -> Self {
        Self {
            held: Arc::new(DashMap::new()),
        }
    }

    /// Number of idle instances currently being kept alive.
    pub fn resident(&self) -> usize {
        self.held.len()
    }

    /// Releases up to `n` holds, least recently admitted first, and returns
    /// how many were actually released.
    pub fn release(&self, n: usize) -> usize {
        // Snapshot the keys before removing; removing during iteration would
        // re-enter the shard locks.
        let mut ids: Vec<HandleId> = self.held.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();

        let mut released = 0;
        for id in ids.into_iter().take(n) {
            if self.held.remove(&id).is_some() {
                released += 1;
            }
        }
        if released > 0 {
            debug!(released, "released idle instances under memory pressure");
        }
        released
    }

    /// Releases every hold.
    pub fn release_all(&self) -> usize {
        self.release(usize::MAX)
    }

    /// Takes a strong hold over a freshly admitted cell.
    pub(crate) fn hold(&self, id: HandleId, cell: Arc<SoftCell<T>>) {
        self.held.insert(id, cell);
    }

    /// Withdraws the hold for `id`. Callers severing an instance resolve the
    /// cell first, so withdrawing here never fires a death report.
    pub(crate) fn withdraw(&self, id: HandleId) {
        self.held.remove(&id);
    }
}

impl<T> Clone for PressureValve<T> {
    fn clone(&self) -> Self {
        Self {
            held: Arc::clone(&self.held),
        }
    }
}

impl<T> fmt::Debug for PressureValve<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PressureValve")
            .field("resident", &self.held.len())
            .finish()
    }
}
