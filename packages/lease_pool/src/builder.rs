use std::any::type_name;
use std::borrow::Cow;
use std::cell::Cell;
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use tracing::{debug, warn};

use crate::{DropPolicy, LeasePool, PoolInner, ReleaseHook};

/// Builder for creating an instance of [`LeasePool`].
///
/// The capacity is mandatory, whereas other settings are optional. The items themselves are
/// produced by the factory passed to [`build()`](Self::build) or
/// [`try_build()`](Self::try_build), which is called once per item before the pool is returned.
///
/// # Examples
///
/// ```
/// use lease_pool::{DropPolicy, LeasePool};
/// use new_zealand::nz;
///
/// let pool = LeasePool::builder()
///     .capacity(nz!(8))
///     .name("scratch_buffers")
///     .drop_policy(DropPolicy::WaitForLeases)
///     .on_release(|buffer: &mut Vec<u8>| buffer.clear())
///     .build(|| Vec::with_capacity(1024));
///
/// assert_eq!(pool.capacity().get(), 8);
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing pool configuration to happen on different threads than where the pool is used.
/// However, it is not thread-safe ([`Sync`]) as it contains mutable configuration state.
#[must_use]
pub struct LeasePoolBuilder<T> {
    capacity: Option<NonZero<usize>>,
    name: Option<Cow<'static, str>>,
    drop_policy: DropPolicy,
    on_release: Option<ReleaseHook<T>>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> LeasePoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            name: None,
            drop_policy: DropPolicy::default(),
            on_release: None,
            _not_sync: PhantomData,
        }
    }

    /// Sets the number of items the pool owns. The pool creates all of them when it is built.
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the name of the pool, which identifies it in log events and `Debug` output.
    ///
    /// Defaults to the type name of the items.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs what happens to
    /// leases that are still outstanding when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Sets a hook that is called with every item at the end of its lease, before the item
    /// becomes available to the next caller.
    ///
    /// Use this to bring items back into a safe initial state, e.g. to clear buffers. The hook
    /// runs on the thread that ends the lease, outside the pool lock.
    ///
    /// If the hook panics, the item is still returned to the pool and the panic is propagated
    /// to the code that ended the lease.
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Builds the pool, calling `factory` once for each item.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    ///
    /// If the factory panics, the items it already produced are dropped and the panic
    /// propagates to the caller.
    pub fn build(self, mut factory: impl FnMut() -> T) -> LeasePool<T> {
        match self.try_build(|| Ok::<T, Infallible>(factory())) {
            Ok(pool) => pool,
            Err(never) => match never {},
        }
    }

    /// Builds the pool, calling `factory` once for each item, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `factory`. Any items already produced by earlier
    /// calls are dropped before the error is returned, so a failed build leaves nothing behind.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    ///
    /// # Examples
    ///
    /// ```
    /// use lease_pool::LeasePool;
    /// use new_zealand::nz;
    ///
    /// let mut remaining_handles = 2;
    ///
    /// let result = LeasePool::builder().capacity(nz!(3)).try_build(|| {
    ///     if remaining_handles == 0 {
    ///         return Err("out of handles");
    ///     }
    ///
    ///     remaining_handles -= 1;
    ///     Ok(remaining_handles)
    /// });
    ///
    /// assert_eq!(result.unwrap_err(), "out of handles");
    /// ```
    pub fn try_build<E>(
        self,
        mut factory: impl FnMut() -> Result<T, E>,
    ) -> Result<LeasePool<T>, E> {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before building the pool");

        let name = self.name.unwrap_or(Cow::Borrowed(type_name::<T>()));

        let mut items = Vec::with_capacity(capacity.get());

        while items.len() < capacity.get() {
            match factory() {
                Ok(item) => items.push(item),
                Err(error) => {
                    warn!(
                        pool = %name,
                        built = items.len(),
                        capacity = capacity.get(),
                        "item factory failed, discarding the items built so far"
                    );

                    drop(items);
                    return Err(error);
                }
            }
        }

        debug!(
            pool = %name,
            capacity = capacity.get(),
            drop_policy = ?self.drop_policy,
            "pool filled"
        );

        Ok(LeasePool::from_inner(PoolInner::new(
            name,
            capacity,
            self.drop_policy,
            self.on_release,
            items,
        )))
    }
}

impl<T> fmt::Debug for LeasePoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeasePoolBuilder")
            .field("capacity", &self.capacity)
            .field("name", &self.name)
            .field("drop_policy", &self.drop_policy)
            .field("has_release_hook", &self.on_release.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::DropTracker;

    use super::*;

    // Test trait implementations.
    assert_impl_all!(LeasePoolBuilder<String>: Send, fmt::Debug);
    assert_not_impl_any!(LeasePoolBuilder<String>: Sync);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = LeasePoolBuilder::<u32>::new();

        assert!(builder.capacity.is_none());
        assert!(builder.name.is_none());
        assert!(builder.on_release.is_none());
        assert_eq!(builder.drop_policy, DropPolicy::default());
        assert_eq!(builder.drop_policy, DropPolicy::LeasesMayOutlive);
    }

    #[test]
    fn settings_can_be_overridden() {
        let builder = LeasePoolBuilder::<u32>::new()
            .capacity(nz!(1))
            .capacity(nz!(2))
            .name("first")
            .name(String::from("second"))
            .drop_policy(DropPolicy::MustNotHaveLeases)
            .drop_policy(DropPolicy::WaitForLeases);

        assert_eq!(builder.capacity, Some(nz!(2)));
        assert_eq!(builder.name.as_deref(), Some("second"));
        assert_eq!(builder.drop_policy, DropPolicy::WaitForLeases);
    }

    #[test]
    fn build_calls_factory_once_per_item() {
        let mut calls = 0;

        let pool = LeasePoolBuilder::new().capacity(nz!(7)).build(|| {
            calls += 1;
            calls
        });

        assert_eq!(calls, 7);
        assert_eq!(pool.stats().available(), 7);
    }

    #[test]
    #[should_panic]
    fn build_without_capacity_panics() {
        let _pool = LeasePoolBuilder::new().build(|| 0_u8);
    }

    #[test]
    fn try_build_failure_drops_items_built_so_far() {
        let tracker = DropTracker::new();
        let mut calls = 0;

        let result = LeasePoolBuilder::new().capacity(nz!(5)).try_build(|| {
            calls += 1;

            if calls == 2 {
                Err("factory failed")
            } else {
                Ok(tracker.item())
            }
        });

        assert_eq!(result.unwrap_err(), "factory failed");
        assert_eq!(calls, 2);
        assert_eq!(tracker.created(), 1);
        assert_eq!(tracker.dropped(), 1);
    }

    #[test]
    fn try_build_success_produces_full_pool() {
        let pool = LeasePoolBuilder::new()
            .capacity(nz!(3))
            .try_build(|| Ok::<_, String>(String::from("item")))
            .unwrap();

        assert_eq!(pool.stats().available(), 3);
    }

    #[test]
    fn panicking_factory_drops_items_built_so_far() {
        let tracker = DropTracker::new();
        let mut calls = 0;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            LeasePoolBuilder::new().capacity(nz!(4)).build(|| {
                calls += 1;
                assert!(calls < 3, "factory exploded");
                tracker.item()
            })
        }));

        assert!(result.is_err());
        assert_eq!(tracker.created(), 2);
        assert_eq!(tracker.dropped(), 2);
    }

    #[test]
    fn name_is_applied_to_pool() {
        let pool = LeasePoolBuilder::new()
            .capacity(nz!(1))
            .name("named")
            .build(|| 0_u8);

        assert_eq!(pool.name(), "named");
    }

    #[test]
    fn builder_is_debug() {
        let builder = LeasePoolBuilder::<u8>::new().capacity(nz!(3));
        let output = format!("{builder:?}");

        assert!(output.contains("LeasePoolBuilder"));
        assert!(output.contains('3'));
    }

    #[test]
    fn builder_can_move_between_threads() {
        let builder = LeasePoolBuilder::new().capacity(nz!(2));

        let handle = std::thread::spawn(move || builder.build(|| 0_u64));
        let pool = handle.join().expect("thread completed successfully");

        assert_eq!(pool.stats().available(), 2);
    }
}
