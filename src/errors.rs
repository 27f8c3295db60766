//! Error types for the pool

use thiserror::Error;

/// Errors surfaced by pool operations.
///
/// `E` is the factory's error type. Factory faults only reach the caller at
/// the call sites that propagate them; the method docs on
/// [`SoftPool`](crate::SoftPool) say which sites swallow instead.
#[derive(Error, Debug)]
pub enum PoolError<E>
where
    E: std::error::Error + 'static,
{
    /// The pool has been closed; borrowing and adding are refused.
    #[error("pool is closed")]
    Closed,

    /// A freshly created instance could not be activated and validated.
    ///
    /// Idle instances that fail the same checks are destroyed quietly and the
    /// borrow retries; only a fresh failure surfaces, carrying its cause.
    #[error("could not produce a validated instance: {0}")]
    Exhausted(#[source] ActivationError<E>),

    /// The factory itself failed at a call site that propagates faults:
    /// creation during a borrow, or any hook during
    /// [`add_object`](crate::SoftPool::add_object).
    #[error(transparent)]
    Factory(#[from] E),
}

/// Why an instance was condemned while being readied for a borrower.
#[derive(Error, Debug)]
pub enum ActivationError<E>
where
    E: std::error::Error + 'static,
{
    /// The factory's `validate` returned `false`.
    #[error("validation failed")]
    Rejected,

    /// The factory's `activate` or `validate` raised a fault.
    #[error(transparent)]
    Fault(#[from] E),
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;
