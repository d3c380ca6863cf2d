//! Pool management and lifecycle.

use std::borrow::Cow;
use std::fmt;
use std::num::NonZero;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::metrics::{ACQUIRE_REJECTED, ACQUIRE_TIMED_OUT, ACQUIRE_WAIT_MS};
use crate::{
    DropPolicy, Error, ItemId, ItemState, Lease, LeasePoolBuilder, PoolState, PoolStats, Result,
};

/// Hook that brings a returned item back into a reusable state.
pub(crate) type ReleaseHook<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// How long an acquisition is willing to wait for an item.
#[derive(Clone, Copy, Debug)]
enum Patience {
    Never,
    Until { deadline: Instant, timeout: Duration },
    Forever,
}

/// The part of the pool shared between the pool handle and every outstanding lease.
pub(crate) struct PoolInner<T> {
    name: Cow<'static, str>,
    capacity: NonZero<usize>,
    drop_policy: DropPolicy,
    on_release: Option<ReleaseHook<T>>,

    state: Mutex<PoolState<T>>,

    // Notified when an item re-enters the pool, when a lease ends after shutdown
    // and when the pool shuts down. Every waiter re-checks its condition after waking.
    changed: Condvar,
}

impl<T> PoolInner<T> {
    pub(crate) fn new(
        name: Cow<'static, str>,
        capacity: NonZero<usize>,
        drop_policy: DropPolicy,
        on_release: Option<ReleaseHook<T>>,
        items: Vec<T>,
    ) -> Self {
        debug_assert_eq!(items.len(), capacity.get());

        Self {
            name,
            capacity,
            drop_policy,
            on_release,
            state: Mutex::new(PoolState::new(items)),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn acquire(self: &Arc<Self>, patience: Patience) -> Result<Lease<T>> {
        let started = Instant::now();

        let mut state = self.state.lock();

        loop {
            if state.is_shut_down() {
                drop(state);

                ACQUIRE_REJECTED.with(|e| e.observe_once());
                trace!(pool = %self.name, "acquire rejected, pool is shut down");
                return Err(Error::ShutDown);
            }

            if let Some((id, item)) = state.take() {
                drop(state);

                ACQUIRE_WAIT_MS.with(|e| e.observe_millis(started.elapsed()));
                trace!(pool = %self.name, item = %id, "item acquired");
                return Ok(Lease::new(id, item, Arc::clone(self)));
            }

            match patience {
                Patience::Never => {
                    drop(state);

                    ACQUIRE_REJECTED.with(|e| e.observe_once());
                    return Err(Error::Exhausted {
                        capacity: self.capacity.get(),
                    });
                }
                Patience::Until { deadline, timeout } => {
                    // The pool was checked above under the same lock, so an item returned right
                    // at the deadline is still picked up rather than reported as a timeout.
                    if Instant::now() >= deadline {
                        drop(state);

                        ACQUIRE_TIMED_OUT.with(|e| e.observe_once());
                        trace!(pool = %self.name, ?timeout, "acquire timed out");
                        return Err(Error::TimedOut { timeout });
                    }

                    self.changed.wait_until(&mut state, deadline);
                }
                Patience::Forever => {
                    self.changed.wait(&mut state);
                }
            }
        }
    }

    /// Takes an item back at the end of its lease.
    pub(crate) fn restore(&self, id: ItemId, mut item: T) {
        // The hook runs outside the lock. If it panics, the item is still returned so the
        // pool keeps its full capacity, and the panic continues once the bookkeeping is done.
        let hook_result = self
            .on_release
            .as_ref()
            .map(|hook| panic::catch_unwind(AssertUnwindSafe(|| hook(&mut item))));

        let destroyed = self.state.lock().put_back(id, item);

        match destroyed {
            None => {
                self.changed.notify_one();
                trace!(pool = %self.name, item = %id, "item returned");
            }
            Some(item) => {
                drop(item);

                // Waking everyone lets a drop that waits for outstanding leases re-check.
                self.changed.notify_all();
                trace!(pool = %self.name, item = %id, "item destroyed at end of lease, pool is shut down");
            }
        }

        if let Some(Err(payload)) = hook_result {
            if thread::panicking() {
                warn!(pool = %self.name, item = %id, "release hook panicked while already unwinding");
            } else {
                panic::resume_unwind(payload);
            }
        }
    }

    fn shut_down(&self) {
        let drained = self.state.lock().shut_down();

        let Some(destroyed) = drained else {
            return;
        };

        self.changed.notify_all();

        debug!(
            pool = %self.name,
            destroyed = destroyed.len(),
            "pool shut down"
        );

        // Dropped outside the lock.
        drop(destroyed);
    }

    #[cfg_attr(test, mutants::skip)] // Can be mutated to wait forever.
    fn wait_for_leases(&self) {
        let mut state = self.state.lock();

        while state.leased() > 0 {
            self.changed.wait(&mut state);
        }
    }

    fn stats(&self) -> PoolStats {
        self.state.lock().stats()
    }
}

impl<T> fmt::Debug for PoolInner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolInner")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("drop_policy", &self.drop_policy)
            .field("has_release_hook", &self.on_release.is_some())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// A fixed set of pre-built items that callers lease for exclusive, short-term use.
///
/// The pool creates all of its items up front, when it is built. Afterwards it never creates
/// another item: [`acquire()`](Self::acquire) hands out an item that is in the pool, blocking
/// the caller while every item is leased, and the item goes back into the pool when the
/// returned [`Lease`] is dropped.
///
/// Items are handed out in first-in, first-out order. When several callers are blocked, there
/// is no guarantee about which of them receives the next returned item.
///
/// # Bounded waiting
///
/// Besides the blocking [`acquire()`](Self::acquire), the pool offers
/// [`try_acquire()`](Self::try_acquire), which never blocks, and
/// [`acquire_timeout()`](Self::acquire_timeout), which blocks for a limited time.
///
/// # Shutdown
///
/// [`shutdown()`](Self::shutdown) destroys every item currently in the pool and makes all
/// current and future acquisitions fail with [`Error::ShutDown`]. Items that are leased at that
/// point are destroyed when their lease ends. Dropping the pool shuts it down and then applies
/// the configured [`DropPolicy`] to any leases still outstanding.
///
/// # Thread safety
///
/// The pool is thread-safe if `T: Send`. Share it between threads by reference (e.g. with
/// [`std::thread::scope`]) or by wrapping it in an [`Arc`].
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use lease_pool::LeasePool;
/// use new_zealand::nz;
///
/// let pool = LeasePool::new(nz!(2), || String::from("connection"));
///
/// thread::scope(|s| {
///     for worker in 0..4 {
///         let pool = &pool;
///
///         s.spawn(move || {
///             // Blocks while both items are leased by other workers.
///             let connection = pool.acquire().unwrap();
///             println!("worker {worker} uses {} {}", *connection, connection.id());
///         });
///     }
/// });
///
/// assert_eq!(pool.stats().available(), 2);
/// ```
pub struct LeasePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> LeasePool<T> {
    /// Creates a pool with `capacity` items, each produced by one call to `factory`.
    ///
    /// Use [`LeasePool::builder()`] for custom configuration or a fallible factory.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lease_pool::LeasePool;
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(3), || "item");
    /// assert_eq!(pool.stats().available(), 3);
    /// ```
    #[must_use]
    pub fn new(capacity: NonZero<usize>, factory: impl FnMut() -> T) -> Self {
        Self::builder().capacity(capacity).build(factory)
    }

    /// Creates a builder for configuring the pool.
    pub fn builder() -> LeasePoolBuilder<T> {
        LeasePoolBuilder::new()
    }

    pub(crate) fn from_inner(inner: PoolInner<T>) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<PoolInner<T>> {
        &self.inner
    }

    /// Leases an item, blocking the calling thread until one is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`] if the pool has been shut down, including when the shutdown
    /// happens while the caller is blocked.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lease_pool::LeasePool;
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(1), || 5_u32);
    ///
    /// let lease = pool.acquire().unwrap();
    /// assert_eq!(*lease, 5);
    /// ```
    pub fn acquire(&self) -> Result<Lease<T>> {
        self.inner.acquire(Patience::Forever)
    }

    /// Leases an item if one is available right now, without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if every item is leased and [`Error::ShutDown`] if the pool
    /// has been shut down.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lease_pool::{Error, LeasePool};
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(1), || 5_u32);
    ///
    /// let _lease = pool.try_acquire().unwrap();
    /// assert!(matches!(pool.try_acquire(), Err(Error::Exhausted { capacity: 1 })));
    /// ```
    pub fn try_acquire(&self) -> Result<Lease<T>> {
        self.inner.acquire(Patience::Never)
    }

    /// Leases an item, blocking the calling thread for at most `timeout` until one is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimedOut`] if no item became available in time and [`Error::ShutDown`]
    /// if the pool has been shut down, including when the shutdown happens while the caller
    /// is blocked.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use lease_pool::{Error, LeasePool};
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(1), || 5_u32);
    /// let _lease = pool.acquire().unwrap();
    ///
    /// let result = pool.acquire_timeout(Duration::from_millis(10));
    /// assert!(matches!(result, Err(Error::TimedOut { .. })));
    /// ```
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Lease<T>> {
        let patience = match Instant::now().checked_add(timeout) {
            Some(deadline) => Patience::Until { deadline, timeout },
            // A deadline beyond what `Instant` can represent is as good as no deadline.
            None => Patience::Forever,
        };

        self.inner.acquire(patience)
    }

    /// Ends a lease explicitly, returning its item to the pool.
    ///
    /// This is equivalent to dropping the lease, except that it verifies that the lease was
    /// issued by this pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignLease`] if the lease was issued by a different pool. The lease
    /// is still ended, with its item returned to the pool that issued it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lease_pool::LeasePool;
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(1), || 5_u32);
    ///
    /// let lease = pool.acquire().unwrap();
    /// pool.release(lease).unwrap();
    ///
    /// assert_eq!(pool.stats().available(), 1);
    /// ```
    pub fn release(&self, lease: Lease<T>) -> Result<()> {
        if !lease.is_issued_by(&self.inner) {
            warn!(
                pool = %self.inner.name,
                item = %lease.id(),
                "rejected a lease issued by a different pool"
            );

            return Err(Error::ForeignLease);
        }

        drop(lease);
        Ok(())
    }

    /// Shuts down the pool.
    ///
    /// Every item currently in the pool is destroyed and all callers blocked in acquisition
    /// are woken with [`Error::ShutDown`]. Items that are leased are destroyed when their
    /// lease ends. Calling this more than once has no further effect.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lease_pool::{Error, LeasePool};
    /// use new_zealand::nz;
    ///
    /// let pool = LeasePool::new(nz!(2), || 5_u32);
    /// pool.shutdown();
    ///
    /// assert!(matches!(pool.acquire(), Err(Error::ShutDown)));
    /// ```
    pub fn shutdown(&self) {
        self.inner.shut_down();
    }

    /// Whether the pool has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.state.lock().is_shut_down()
    }

    /// Takes a snapshot of how many items are available and how many are leased.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.stats()
    }

    /// The fixed number of items the pool was built with.
    #[must_use]
    pub fn capacity(&self) -> NonZero<usize> {
        self.inner.capacity
    }

    /// The current lifecycle state of one item, or `None` if the pool has no such item.
    #[must_use]
    pub fn item_state(&self, id: ItemId) -> Option<ItemState> {
        self.inner.state.lock().item_state(id)
    }

    /// The name of the pool, as used in log events.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<T> Drop for LeasePool<T> {
    fn drop(&mut self) {
        self.inner.shut_down();

        let outstanding = self.inner.stats().leased();

        if outstanding == 0 {
            return;
        }

        match self.inner.drop_policy {
            DropPolicy::LeasesMayOutlive => {
                warn!(
                    pool = %self.inner.name,
                    outstanding,
                    "pool dropped with outstanding leases, their items are destroyed when the leases end"
                );
            }
            DropPolicy::MustNotHaveLeases => {
                // If we are already panicking, a second panic would only obscure the first.
                if !thread::panicking() {
                    panic!(
                        "dropped LeasePool '{}' with {outstanding} outstanding leases - this is forbidden by DropPolicy::MustNotHaveLeases",
                        self.inner.name
                    );
                }
            }
            DropPolicy::WaitForLeases => {
                debug!(
                    pool = %self.inner.name,
                    outstanding,
                    "waiting for outstanding leases before completing pool drop"
                );

                self.inner.wait_for_leases();
            }
        }
    }
}

impl<T> fmt::Debug for LeasePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeasePool")
            .field("inner", &self.inner)
            .finish()
    }
}
