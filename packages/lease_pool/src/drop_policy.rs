/// Determines what happens to outstanding leases when a [`LeasePool`][crate::LeasePool] is dropped.
///
/// Dropping the pool always shuts it down first: items that are available in the pool are
/// destroyed immediately and any callers blocked in acquisition are woken with
/// [`Error::ShutDown`][crate::Error::ShutDown]. The policy only governs items that are
/// leased at that moment.
///
/// # Examples
///
/// ```
/// use lease_pool::{DropPolicy, LeasePool};
/// use new_zealand::nz;
///
/// let pool = LeasePool::builder()
///     .capacity(nz!(4))
///     .drop_policy(DropPolicy::MustNotHaveLeases)
///     .build(Vec::<u8>::new);
///
/// let lease = pool.acquire().unwrap();
/// drop(lease);
///
/// // No leases are outstanding, so dropping the pool is fine.
/// drop(pool);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// Leases may outlive the pool. Each outstanding item is destroyed when its lease ends
    /// instead of being returned. This is the default.
    #[default]
    LeasesMayOutlive,

    /// The pool will panic if any lease is still outstanding when it is dropped.
    ///
    /// This may be valuable if items must be torn down in a specific order relative to the
    /// pool, making a lease that outlives the pool a bug in the caller.
    MustNotHaveLeases,

    /// Dropping the pool blocks the dropping thread until every outstanding lease has ended.
    ///
    /// The dropping thread must not itself hold a lease from the pool, as that would never end.
    WaitForLeases,
}
