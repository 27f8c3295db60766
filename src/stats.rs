//! Pool statistics snapshot

/// Point-in-time view of a pool's counters and gauges.
///
/// Taken with [`SoftPool::stats`](crate::SoftPool::stats). Counters are
/// cumulative since the pool was built; `idle` and `active` are the gauges
/// at snapshot time, after pending reclamation notices were drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolStats {
    /// Successful borrows handed to callers.
    pub borrowed: u64,
    /// Instances checked back in, whether re-admitted or destroyed.
    pub returned: u64,
    /// Instances expelled through invalidation.
    pub invalidated: u64,
    /// Instances the factory created.
    pub created: u64,
    /// Instances handed to the factory's `destroy`.
    pub destroyed: u64,
    /// Candidates condemned during activation or validation.
    pub rejected: u64,
    /// Idle instances reclaimed by the memory manager.
    pub reclaimed: u64,
    /// Idle instances currently resident.
    pub idle: usize,
    /// Instances currently checked out.
    pub active: usize,
    /// Whether the pool has been closed.
    pub closed: bool,
}

/// Cumulative counters kept inside the pool's lock.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) borrowed: u64,
    pub(crate) returned: u64,
    pub(crate) invalidated: u64,
    pub(crate) created: u64,
    pub(crate) destroyed: u64,
    pub(crate) rejected: u64,
    pub(crate) reclaimed: u64,
}

impl Counters {
    pub(crate) fn snapshot(&self, idle: usize, active: usize, closed: bool) -> PoolStats {
        PoolStats {
            borrowed: self.borrowed,
            returned: self.returned,
            invalidated: self.invalidated,
            created: self.created,
            destroyed: self.destroyed,
            rejected: self.rejected,
            reclaimed: self.reclaimed,
            idle,
            active,
            closed,
        }
    }
}
