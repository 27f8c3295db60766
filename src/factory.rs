//! Factory contract for pooled instances

/// Lifecycle hooks the pool runs on the instances it manages.
///
/// Only [`make`](ObjectFactory::make) has no default; every other hook
/// defaults to succeeding without side effects. The pool calls all hooks
/// while holding its internal lock, so they should be quick and must not call
/// back into the pool.
///
/// `validate` separates a clean rejection (`Ok(false)`) from a fault (`Err`).
/// A rejected instance is destroyed quietly; what happens to a faulting one
/// depends on the operation, see the fault notes on
/// [`SoftPool`](crate::SoftPool).
///
/// # Examples
///
/// ```rust
/// use softpool::ObjectFactory;
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
///
///     fn passivate(&self, buf: &mut Vec<u8>) -> Result<(), Self::Error> {
///         buf.clear();
///         Ok(())
///     }
/// }
/// ```
pub trait ObjectFactory {
    /// The pooled instance type.
    type Object;

    /// Error raised by the hooks.
    type Error: std::error::Error + 'static;

    /// Creates a new instance.
    fn make(&self) -> Result<Self::Object, Self::Error>;

    /// Prepares an instance, idle or freshly made, for a borrower.
    fn activate(&self, _obj: &mut Self::Object) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Checks whether an instance is fit for use. `Ok(false)` condemns it
    /// without counting as a fault.
    fn validate(&self, _obj: &Self::Object) -> Result<bool, Self::Error> {
        Ok(true)
    }

    /// Quiesces an instance before it re-enters the idle set.
    fn passivate(&self, _obj: &mut Self::Object) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Tears an instance down. The default just drops it.
    fn destroy(&self, obj: Self::Object) -> Result<(), Self::Error> {
        drop(obj);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Numbers;

    impl ObjectFactory for Numbers {
        type Object = u32;
        type Error = std::convert::Infallible;

        fn make(&self) -> Result<u32, Self::Error> {
            Ok(7)
        }
    }

    #[test]
    fn test_default_hooks_succeed() {
        let factory = Numbers;
        let mut obj = factory.make().unwrap();
        factory.activate(&mut obj).unwrap();
        assert!(factory.validate(&obj).unwrap());
        factory.passivate(&mut obj).unwrap();
        factory.destroy(obj).unwrap();
    }
}
