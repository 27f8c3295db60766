//! # softpool
//!
//! Thread-safe object pool whose idle members are only weakly held, so the
//! host can take the memory back whenever it needs to.
//!
//! Borrowers always get a validated, activated instance; returned instances
//! are passivated and parked behind weak handles. The strong holds that keep
//! idle instances alive sit in a [`PressureValve`] driven by the host's
//! memory watcher: releasing a hold drops the instance in place, and the
//! pool quietly forgets the matching handle the next time it looks. The pool
//! never caps how many instances it hands out and never makes a borrower
//! wait.
//!
//! ## Features
//!
//! - Full instance lifecycle through a five-hook [`ObjectFactory`]
//! - Automatic check-in on drop via RAII ([`PooledObject`])
//! - Weakly-held idle set, reclaimed under memory pressure
//! - Per-site fault policy: swallowed where the pool can recover, surfaced
//!   where the caller must know
//! - Counters snapshot ([`PoolStats`]), serde-serializable behind the
//!   `serde` feature
//!
//! ## Quick Start
//!
//! ```rust
//! use softpool::{ObjectFactory, SoftPool};
//!
//! struct Buffers;
//!
//! impl ObjectFactory for Buffers {
//!     type Object = Vec<u8>;
//!     type Error = std::convert::Infallible;
//!
//!     fn make(&self) -> Result<Vec<u8>, Self::Error> {
//!         Ok(Vec::with_capacity(4096))
//!     }
//! }
//!
//! let pool = SoftPool::new(Buffers);
//! {
//!     let mut buf = pool.borrow().unwrap();
//!     buf.extend_from_slice(b"scratch");
//!     // checked back in when `buf` goes out of scope
//! }
//! assert_eq!(pool.idle_count(), 1);
//!
//! // the host decides when idle memory goes away
//! pool.pressure_valve().release_all();
//! assert_eq!(pool.idle_count(), 0);
//! ```

mod pool;
mod factory;
mod handle;
mod reclaim;
mod stats;
mod errors;

pub use errors::{ActivationError, PoolError, PoolResult};
pub use factory::ObjectFactory;
pub use pool::{PooledObject, SoftPool};
pub use reclaim::PressureValve;
pub use stats::PoolStats;
