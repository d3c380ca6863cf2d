use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::{ItemId, PoolInner};

/// Exclusive ownership of one item borrowed from a [`LeasePool`][crate::LeasePool].
///
/// The item is accessible through [`Deref`] and [`DerefMut`]. No other caller can observe the
/// item while the lease exists, and the pool itself only counts the item as leased.
///
/// Dropping the lease ends it: the item goes back to the pool and one caller blocked in
/// acquisition (if any) is woken up. [`LeasePool::release()`][crate::LeasePool::release] does
/// the same explicitly. Because ending a lease consumes it, an item cannot be returned twice.
///
/// A lease may outlive its pool. If the pool has shut down by the time the lease ends, the
/// item is destroyed instead of being returned. See [`DropPolicy`][crate::DropPolicy].
///
/// # Thread safety
///
/// The lease can be moved to another thread if `T: Send` and shared between threads if
/// `T: Sync`.
///
/// # Example
///
/// ```rust
/// use lease_pool::LeasePool;
/// use new_zealand::nz;
///
/// let pool = LeasePool::new(nz!(1), || vec![0_u8; 4]);
///
/// let mut buffer = pool.acquire().unwrap();
/// buffer[0] = 42;
/// drop(buffer);
///
/// // The same item comes back, still holding what the previous lessee wrote into it.
/// let buffer = pool.acquire().unwrap();
/// assert_eq!(buffer[0], 42);
/// ```
pub struct Lease<T> {
    id: ItemId,

    // Taken out exactly once, in `drop()`.
    item: ManuallyDrop<T>,

    pool: Arc<PoolInner<T>>,
}

impl<T> Lease<T> {
    pub(crate) fn new(id: ItemId, item: T, pool: Arc<PoolInner<T>>) -> Self {
        Self {
            id,
            item: ManuallyDrop::new(item),
            pool,
        }
    }

    /// The identity of the leased item within its pool.
    ///
    /// Two leases that are alive at the same time never have the same identity if they were
    /// issued by the same pool.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub(crate) fn is_issued_by(&self, pool: &Arc<PoolInner<T>>) -> bool {
        Arc::ptr_eq(&self.pool, pool)
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.item
    }
}

impl<T> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.item
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        // SAFETY: The item is only ever taken here and the lease is never used again after
        // drop, so the `ManuallyDrop` is read exactly once and never touched afterwards.
        let item = unsafe { ManuallyDrop::take(&mut self.item) };

        self.pool.restore(self.id, item);
    }
}

impl<T> fmt::Debug for Lease<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("id", &self.id)
            .field("item", &*self.item)
            .field("pool", &self.pool.name())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::LeasePool;

    assert_impl_all!(Lease<String>: Send, Sync, fmt::Debug);
    assert_impl_all!(Lease<Cell<u32>>: Send);
    assert_not_impl_any!(Lease<Cell<u32>>: Sync);
    assert_not_impl_any!(Lease<Rc<u32>>: Send, Sync);

    #[test]
    fn deref_reaches_item() {
        let pool = LeasePool::new(nz!(1), || String::from("item"));

        let lease = pool.acquire().unwrap();
        assert_eq!(&*lease, "item");
        assert_eq!(lease.len(), 4);
    }

    #[test]
    fn deref_mut_changes_item_in_place() {
        let pool = LeasePool::new(nz!(1), String::new);

        let mut lease = pool.acquire().unwrap();
        lease.push_str("changed");
        drop(lease);

        let lease = pool.acquire().unwrap();
        assert_eq!(&*lease, "changed");
    }

    #[test]
    fn drop_returns_item_to_pool() {
        let pool = LeasePool::new(nz!(2), || 0_u64);

        let lease = pool.acquire().unwrap();
        assert_eq!(pool.stats().leased(), 1);

        drop(lease);
        assert_eq!(pool.stats().leased(), 0);
        assert_eq!(pool.stats().available(), 2);
    }

    #[test]
    fn id_matches_construction_order() {
        let pool = LeasePool::new(nz!(2), || 0_u64);

        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();

        assert_eq!(first.id().index(), 0);
        assert_eq!(second.id().index(), 1);
    }

    #[test]
    fn debug_includes_item_and_pool_name() {
        let pool = LeasePool::builder()
            .capacity(nz!(1))
            .name("debuggable")
            .build(|| 77_u32);

        let lease = pool.acquire().unwrap();
        let output = format!("{lease:?}");

        assert!(output.contains("77"));
        assert!(output.contains("debuggable"));
    }

    #[test]
    fn is_issued_by_distinguishes_pools() {
        let pool1 = LeasePool::new(nz!(1), || 1_u8);
        let pool2 = LeasePool::new(nz!(1), || 2_u8);

        let lease = pool1.acquire().unwrap();

        assert!(lease.is_issued_by(pool1.inner()));
        assert!(!lease.is_issued_by(pool2.inner()));
    }
}
