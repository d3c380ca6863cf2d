#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A fixed-capacity object pool that lends its items to one caller at a time.
//!
//! This crate provides [`LeasePool`], which builds a fixed number of items up front and hands
//! them out to any number of concurrent callers. A caller that finds every item leased blocks
//! until another caller returns one. Each handed-out item is represented by a [`Lease`], which
//! owns the item exclusively and returns it to the pool when dropped.
//!
//! # Key features
//!
//! - **Fixed capacity**: All items are created when the pool is built; a failing item factory
//!   fails the build without leaking the items built before it.
//! - **Blocking, bounded or non-blocking acquisition**: [`LeasePool::acquire()`],
//!   [`LeasePool::acquire_timeout()`] and [`LeasePool::try_acquire()`].
//! - **Automatic return**: Dropping a [`Lease`] returns its item and wakes one blocked caller.
//! - **Graceful shutdown**: [`LeasePool::shutdown()`] fails all blocked and future acquisitions
//!   instead of leaving threads blocked forever.
//! - **Configurable teardown**: A [`DropPolicy`] decides what happens to leases that are still
//!   outstanding when the pool is dropped.
//! - **Item reset**: An optional hook brings every returned item back to a reusable state.
//!
//! # Example
//!
//! ```rust
//! use std::thread;
//!
//! use lease_pool::LeasePool;
//! use new_zealand::nz;
//!
//! // Ten packets shared by twenty workers.
//! let pool = LeasePool::builder()
//!     .capacity(nz!(10))
//!     .name("packets")
//!     .on_release(|packet: &mut Vec<u8>| packet.clear())
//!     .build(|| Vec::with_capacity(1024));
//!
//! thread::scope(|s| {
//!     for worker in 0_u8..20 {
//!         let pool = &pool;
//!
//!         s.spawn(move || {
//!             let mut packet = pool.acquire().unwrap();
//!             packet.push(worker);
//!         });
//!     }
//! });
//!
//! let stats = pool.stats();
//! assert_eq!(stats.available(), 10);
//! assert_eq!(stats.leased(), 0);
//! ```
//!
//! # Logging and metrics
//!
//! Acquisitions, returns, construction and shutdown are reported as [`tracing`] events under
//! the name of the pool. Acquisition wait times, timeouts and rejections are recorded as
//! [`nm`] events named `lease_pool_acquire_wait_ms`, `lease_pool_acquire_timed_out` and
//! `lease_pool_acquire_rejected`.

mod builder;
mod drop_policy;
mod error;
mod item;
mod lease;
mod metrics;
mod pool;
mod state;
mod stats;

pub use builder::*;
pub use drop_policy::*;
pub use error::Error;
pub(crate) use error::Result;
pub use item::*;
pub use lease::*;
pub use pool::LeasePool;
pub(crate) use pool::{PoolInner, ReleaseHook};
pub(crate) use state::*;
pub use stats::*;
