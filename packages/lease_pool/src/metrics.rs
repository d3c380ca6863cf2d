//! Metrics for lease pools.
//!
//! The events are shared by all pools in the process. They use per-thread event instances to
//! avoid adding contention on top of the pool lock.

use nm::{Event, Magnitude};

/// Histogram buckets for acquisition wait time in milliseconds.
///
/// Most acquisitions find an item immediately. Anything beyond that is the time a caller spent
/// blocked until another caller returned an item.
const ACQUIRE_WAIT_MS_BUCKETS: &[Magnitude] = &[0, 1, 2, 5, 10, 20, 50, 100, 200, 500, 1000, 5000];

thread_local! {
    /// Event for observing how long a successful acquisition waited for an item.
    ///
    /// The magnitude is the wait time in milliseconds.
    pub(crate) static ACQUIRE_WAIT_MS: Event = Event::builder()
        .name("lease_pool_acquire_wait_ms")
        .histogram(ACQUIRE_WAIT_MS_BUCKETS)
        .build();

    /// Event for acquisitions that gave up because their timeout elapsed.
    pub(crate) static ACQUIRE_TIMED_OUT: Event = Event::builder()
        .name("lease_pool_acquire_timed_out")
        .build();

    /// Event for acquisitions that failed because the pool was shut down or because the caller
    /// did not want to wait for an exhausted pool.
    pub(crate) static ACQUIRE_REJECTED: Event = Event::builder()
        .name("lease_pool_acquire_rejected")
        .build();
}
