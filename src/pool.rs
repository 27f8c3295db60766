//! Core pool implementation

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::errors::{ActivationError, PoolError, PoolResult};
use crate::factory::ObjectFactory;
use crate::handle::{HandleId, ReclaimQueue, SoftCell, SoftHandle};
use crate::reclaim::PressureValve;
use crate::stats::{Counters, PoolStats};

/// A borrowed instance that checks itself back in when dropped.
///
/// Dropping the guard runs the normal return path but absorbs any validation
/// fault, since a destructor has nowhere to surface it. Use
/// [`put_back`](PooledObject::put_back) when return faults matter, or
/// [`invalidate`](PooledObject::invalidate) to expel the instance for good.
pub struct PooledObject<'p, F: ObjectFactory> {
    value: Option<F::Object>,
    pool: &'p SoftPool<F>,
}

impl<'p, F: ObjectFactory> PooledObject<'p, F> {
    fn new(value: F::Object, pool: &'p SoftPool<F>) -> Self {
        Self {
            value: Some(value),
            pool,
        }
    }

    /// Returns the instance to the pool.
    ///
    /// A healthy instance is passivated and re-admitted to the idle set. One
    /// that fails validation, faults during passivation, or comes home to a
    /// closed pool is destroyed instead, with destroy faults swallowed. Only
    /// a validation fault surfaces; the checkout ends either way.
    pub fn put_back(mut self) -> Result<(), F::Error> {
        let value = self.value.take().expect("value already taken");
        self.pool.check_in(value)
    }

    /// Expels the instance: destroyed, never re-admitted, checked in for
    /// accounting. This is the one operation that surfaces destroy faults.
    pub fn invalidate(mut self) -> Result<(), F::Error> {
        let value = self.value.take().expect("value already taken");
        self.pool.expel(value)
    }
}

impl<F: ObjectFactory> Deref for PooledObject<'_, F> {
    type Target = F::Object;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("value already taken")
    }
}

impl<F: ObjectFactory> DerefMut for PooledObject<'_, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("value already taken")
    }
}

impl<F: ObjectFactory> Drop for PooledObject<'_, F> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.check_in_on_drop(value);
        }
    }
}

/// Mutable pool state, all behind one lock.
struct Core<T> {
    idle: Vec<SoftHandle<T>>,
    active: usize,
    closed: bool,
    next_id: u64,
    counters: Counters,
}

impl<T> Core<T> {
    fn next_handle_id(&mut self) -> HandleId {
        self.next_id += 1;
        HandleId::new(self.next_id)
    }
}

/// Thread-safe object pool whose idle members are only weakly held.
///
/// Idle instances sit behind weak handles; the strong holds live in a
/// [`PressureValve`] the host's memory watcher can drain at any time. The
/// pool places no cap on how many instances it hands out and never makes a
/// borrower wait: an empty idle set means the factory makes a fresh instance
/// on the spot.
///
/// Every operation takes one internal lock for its whole duration, factory
/// calls included, so factory hooks must not call back into the pool.
///
/// # Examples
///
/// ```rust
/// use softpool::{ObjectFactory, SoftPool};
///
/// struct Buffers;
///
/// impl ObjectFactory for Buffers {
///     type Object = Vec<u8>;
///     type Error = std::convert::Infallible;
///
///     fn make(&self) -> Result<Vec<u8>, Self::Error> {
///         Ok(Vec::with_capacity(4096))
///     }
/// }
///
/// let pool = SoftPool::new(Buffers);
/// let mut buf = pool.borrow().unwrap();
/// buf.extend_from_slice(b"scratch");
/// drop(buf); // checked back in
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct SoftPool<F: ObjectFactory> {
    factory: F,
    core: Mutex<Core<F::Object>>,
    changed: Condvar,
    reclaimed: Arc<ReclaimQueue>,
    valve: PressureValve<F::Object>,
}

impl<F: ObjectFactory> SoftPool<F> {
    /// Creates an empty pool around `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            core: Mutex::new(Core {
                idle: Vec::new(),
                active: 0,
                closed: false,
                next_id: 0,
                counters: Counters::default(),
            }),
            changed: Condvar::new(),
            reclaimed: Arc::new(ReclaimQueue::new()),
            valve: PressureValve::new(),
        }
    }

    /// Borrows a validated, activated instance.
    ///
    /// Idle instances are tried most-recently-returned first. A candidate
    /// whose handle turns out dead is skipped; one that fails activation or
    /// validation is destroyed (faults swallowed) and the next is tried.
    /// Once the idle set is exhausted the factory makes a fresh instance; if
    /// that one fails the checks it is destroyed too and the borrow ends with
    /// [`PoolError::Exhausted`] carrying the cause. A `make` fault surfaces
    /// as [`PoolError::Factory`].
    pub fn borrow(&self) -> PoolResult<PooledObject<'_, F>, F::Error> {
        let mut core = self.core.lock();
        if core.closed {
            return Err(PoolError::Closed);
        }
        loop {
            let (obj, fresh) = match core.idle.pop() {
                Some(handle) => match self.sever(handle) {
                    Some(obj) => (obj, false),
                    None => {
                        trace!("skipped a handle whose instance was already reclaimed");
                        continue;
                    }
                },
                None => {
                    let obj = self.factory.make().map_err(PoolError::Factory)?;
                    core.counters.created += 1;
                    (obj, true)
                }
            };

            match self.ready(obj) {
                Ok(obj) => {
                    core.active += 1;
                    core.counters.borrowed += 1;
                    return Ok(PooledObject::new(obj, self));
                }
                Err((obj, cause)) => {
                    core.counters.rejected += 1;
                    debug!(%cause, fresh, "condemned a borrow candidate");
                    self.destroy_quietly(&mut core, obj);
                    if fresh {
                        return Err(PoolError::Exhausted(cause));
                    }
                }
            }
        }
    }

    /// Creates, validates, passivates and admits one idle instance.
    ///
    /// `make`, `validate` and `passivate` faults all propagate. An instance
    /// that validation merely rejects is destroyed quietly and the call still
    /// returns `Ok`.
    pub fn add_object(&self) -> PoolResult<(), F::Error> {
        let mut core = self.core.lock();
        if core.closed {
            return Err(PoolError::Closed);
        }
        let mut obj = self.factory.make()?;
        core.counters.created += 1;
        if self.factory.validate(&obj)? {
            self.factory.passivate(&mut obj)?;
            self.admit(&mut core, obj);
            self.changed.notify_all();
        } else {
            core.counters.rejected += 1;
            self.destroy_quietly(&mut core, obj);
        }
        Ok(())
    }

    /// Adds `count` idle instances, stopping at the first fault.
    pub fn prefill(&self, count: usize) -> PoolResult<(), F::Error> {
        for _ in 0..count {
            self.add_object()?;
        }
        Ok(())
    }

    /// Number of idle instances, after draining pending reclamation notices.
    pub fn idle_count(&self) -> usize {
        let mut core = self.core.lock();
        self.prune(&mut core);
        core.idle.len()
    }

    /// Number of instances currently checked out.
    pub fn active_count(&self) -> usize {
        self.core.lock().active
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.core.lock().closed
    }

    /// The factory this pool was built around.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Snapshot of counters and gauges, after draining pending reclamation
    /// notices.
    pub fn stats(&self) -> PoolStats {
        let mut core = self.core.lock();
        self.prune(&mut core);
        core.counters
            .snapshot(core.idle.len(), core.active, core.closed)
    }

    /// A clonable handle the host's memory watcher uses to release idle
    /// instances under pressure.
    pub fn pressure_valve(&self) -> PressureValve<F::Object> {
        self.valve.clone()
    }

    /// Destroys every idle instance still resident, best effort: destroy
    /// faults are swallowed and the sweep continues. Checked-out instances
    /// are untouched.
    pub fn clear(&self) {
        let mut core = self.core.lock();
        self.clear_idle(&mut core);
    }

    /// Closes the pool and clears its idle set.
    ///
    /// Idempotent. Instances already checked out may still be returned or
    /// invalidated afterwards; a post-close return always ends in
    /// destruction.
    pub fn close(&self) {
        let mut core = self.core.lock();
        if !core.closed {
            core.closed = true;
            debug!("pool closed");
        }
        self.clear_idle(&mut core);
    }

    /// Parks the caller until another thread checks an instance in, expels
    /// one, or adds one.
    ///
    /// This is the hook for wrappers that bound the pool from outside: wait
    /// here after a failed admission check, then re-check the predicate.
    pub fn wait_for_change(&self) {
        let mut core = self.core.lock();
        self.changed.wait(&mut core);
    }

    /// Checks an instance back in, surfacing validation faults.
    fn check_in(&self, mut obj: F::Object) -> Result<(), F::Error> {
        let mut core = self.core.lock();
        let open = !core.closed;
        match self.factory.validate(&obj) {
            Ok(valid) => {
                let mut admit = open && valid;
                if admit && let Err(fault) = self.factory.passivate(&mut obj) {
                    debug!(%fault, "passivation fault on return; destroying the instance");
                    admit = false;
                }
                self.finish_return(&mut core, obj, admit);
                Ok(())
            }
            Err(fault) => {
                // The checkout ends here too; the caller no longer owns the
                // instance, so it cannot be handed back for a retry.
                self.finish_return(&mut core, obj, false);
                Err(fault)
            }
        }
    }

    /// Drop-path check-in: same flow, but validation faults are absorbed
    /// because a destructor has no caller to surface them to.
    fn check_in_on_drop(&self, mut obj: F::Object) {
        let mut core = self.core.lock();
        let open = !core.closed;
        let valid = match self.factory.validate(&obj) {
            Ok(valid) => valid,
            Err(fault) => {
                warn!(%fault, "validation fault while returning a dropped instance");
                false
            }
        };
        let mut admit = open && valid;
        if admit && let Err(fault) = self.factory.passivate(&mut obj) {
            debug!(%fault, "passivation fault on return; destroying the instance");
            admit = false;
        }
        self.finish_return(&mut core, obj, admit);
    }

    /// Ends a checkout: decrement, then re-admit or destroy.
    fn finish_return(&self, core: &mut Core<F::Object>, obj: F::Object, admit: bool) {
        core.active -= 1;
        core.counters.returned += 1;
        if admit {
            self.admit(core, obj);
            self.changed.notify_all();
        } else {
            self.changed.notify_all();
            self.destroy_quietly(core, obj);
        }
    }

    /// Expels a checked-out instance. Destroy faults propagate, and a failed
    /// destroy skips the change notification.
    fn expel(&self, obj: F::Object) -> Result<(), F::Error> {
        let mut core = self.core.lock();
        core.active -= 1;
        core.counters.invalidated += 1;
        core.counters.destroyed += 1;
        self.factory.destroy(obj)?;
        self.changed.notify_all();
        Ok(())
    }

    /// Admits an instance into the idle set: one fresh cell, strongly held
    /// by the valve, weakly referenced from the idle stack.
    fn admit(&self, core: &mut Core<F::Object>, obj: F::Object) {
        let id = core.next_handle_id();
        let cell = Arc::new(SoftCell::new(id, obj, Arc::clone(&self.reclaimed)));
        core.idle.push(SoftHandle::new(id, Arc::downgrade(&cell)));
        self.valve.hold(id, cell);
    }

    /// Resolves a handle and withdraws the strong hold, so the caller ends
    /// up owning the instance outright. `None` means the memory manager
    /// already reclaimed it.
    fn sever(&self, handle: SoftHandle<F::Object>) -> Option<F::Object> {
        let id = handle.id();
        let cell = handle.resolve()?;
        self.valve.withdraw(id);
        cell.sever()
    }

    /// Activates then validates a candidate; on failure the instance comes
    /// back alongside the cause.
    fn ready(
        &self,
        mut obj: F::Object,
    ) -> Result<F::Object, (F::Object, ActivationError<F::Error>)> {
        if let Err(fault) = self.factory.activate(&mut obj) {
            return Err((obj, ActivationError::Fault(fault)));
        }
        match self.factory.validate(&obj) {
            Ok(true) => Ok(obj),
            Ok(false) => Err((obj, ActivationError::Rejected)),
            Err(fault) => Err((obj, ActivationError::Fault(fault))),
        }
    }

    fn destroy_quietly(&self, core: &mut Core<F::Object>, obj: F::Object) {
        core.counters.destroyed += 1;
        if let Err(fault) = self.factory.destroy(obj) {
            debug!(%fault, "swallowed a destroy fault");
        }
    }

    /// Drains pending reclamation notices and drops the matching handles.
    /// Notices for handles that already left the idle set are no-ops.
    fn prune(&self, core: &mut Core<F::Object>) {
        while let Some(id) = self.reclaimed.pop() {
            core.counters.reclaimed += 1;
            if let Some(at) = core.idle.iter().position(|handle| handle.id() == id) {
                core.idle.remove(at);
                trace!(%id, "pruned a reclaimed idle instance");
            }
        }
    }

    fn clear_idle(&self, core: &mut Core<F::Object>) {
        while let Some(handle) = core.idle.pop() {
            if let Some(obj) = self.sever(handle) {
                self.destroy_quietly(core, obj);
            }
        }
        self.prune(core);
        debug!("cleared idle instances");
    }
}

impl<F: ObjectFactory> fmt::Debug for SoftPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("SoftPool")
            .field("idle", &core.idle.len())
            .field("active", &core.active)
            .field("closed", &core.closed)
            .finish_non_exhaustive()
    }
}
