use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when leasing items from or returning items to a
/// [`LeasePool`][crate::LeasePool].
///
/// Failures of the item factory during pool construction are not represented here. They are
/// returned unchanged from [`LeasePoolBuilder::try_build()`][crate::LeasePoolBuilder::try_build].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The pool has been shut down, either explicitly via
    /// [`LeasePool::shutdown()`][crate::LeasePool::shutdown] or because it was dropped.
    ///
    /// Callers that were blocked waiting for an item also receive this error when the pool
    /// shuts down.
    #[error("the pool has been shut down and no longer issues leases")]
    ShutDown,

    /// No item was returned to the pool within the time the caller was willing to wait.
    #[error("no item became available within {timeout:?}")]
    TimedOut {
        /// How long the caller waited before giving up.
        timeout: Duration,
    },

    /// Every item of the pool is currently leased and the caller asked not to wait.
    #[error("all {capacity} items of the pool are currently leased")]
    Exhausted {
        /// The fixed number of items owned by the pool.
        capacity: usize,
    },

    /// The lease was issued by a different pool than the one it was returned to.
    ///
    /// The lease is not accepted by the wrong pool. It is instead handed back to the pool that
    /// issued it, so neither pool's bookkeeping is affected.
    #[error("the lease was issued by a different pool")]
    ForeignLease,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Copy);

    #[test]
    fn timed_out_mentions_timeout() {
        let error = Error::TimedOut {
            timeout: Duration::from_millis(250),
        };

        assert_eq!(error.to_string(), "no item became available within 250ms");
    }

    #[test]
    fn exhausted_mentions_capacity() {
        let error = Error::Exhausted { capacity: 7 };

        assert_eq!(error.to_string(), "all 7 items of the pool are currently leased");
    }

    #[test]
    fn is_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(Error::ShutDown);
        assert!(error.to_string().contains("shut down"));
    }
}
