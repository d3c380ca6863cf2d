use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how many [`Tracked`] items have been created and destroyed.
///
/// Used to verify that a pool destroys exactly the items it should, e.g. that a failed build
/// does not leak the items built before the failure.
///
/// # Example
///
/// ```rust
/// use testing::DropTracker;
///
/// let tracker = DropTracker::new();
///
/// let item = tracker.item();
/// assert_eq!(tracker.alive(), 1);
///
/// drop(item);
/// assert_eq!(tracker.dropped(), 1);
/// assert_eq!(tracker.alive(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DropTracker {
    created: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl DropTracker {
    /// Creates a tracker with all counts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new item whose destruction this tracker counts.
    ///
    /// Items get consecutive serial numbers starting from zero.
    #[must_use]
    pub fn item(&self) -> Tracked {
        let serial = self.created.fetch_add(1, Ordering::SeqCst);

        Tracked {
            serial,
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// How many items this tracker has created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// How many items created by this tracker have been dropped.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// How many items created by this tracker are still alive.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.created().saturating_sub(self.dropped())
    }
}

/// An item that reports its destruction to the [`DropTracker`] that created it.
#[derive(Debug)]
pub struct Tracked {
    serial: usize,
    dropped: Arc<AtomicUsize>,
}

impl Tracked {
    /// The creation order of this item within its tracker, starting from zero.
    #[must_use]
    pub fn serial(&self) -> usize {
        self.serial
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
