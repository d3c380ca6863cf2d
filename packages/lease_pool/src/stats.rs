use std::fmt;

/// A point-in-time snapshot of how the items of a [`LeasePool`][crate::LeasePool] are distributed.
///
/// While the pool has not been shut down, `available() + leased() == capacity()` holds for
/// every snapshot. After shutdown, no items are available and `leased()` counts the leases that
/// have not yet ended.
///
/// The snapshot is taken under the pool lock but may be out of date as soon as it is returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolStats {
    capacity: usize,
    available: usize,
    leased: usize,
    is_shut_down: bool,
}

impl PoolStats {
    pub(crate) const fn new(
        capacity: usize,
        available: usize,
        leased: usize,
        is_shut_down: bool,
    ) -> Self {
        Self {
            capacity,
            available,
            leased,
            is_shut_down,
        }
    }

    /// The fixed number of items the pool was built with.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many items were in the pool, ready to be acquired.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.available
    }

    /// How many items were held by outstanding leases.
    #[must_use]
    pub const fn leased(&self) -> usize {
        self.leased
    }

    /// Whether the pool had been shut down.
    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.is_shut_down
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} available, {} leased, capacity {}",
            self.available, self.leased, self.capacity
        )?;

        if self.is_shut_down {
            write!(f, " (shut down)")?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn display_includes_all_counts() {
        let stats = PoolStats::new(5, 3, 2, false);
        assert_eq!(stats.to_string(), "3 available, 2 leased, capacity 5");
    }

    #[test]
    fn display_marks_shut_down() {
        let stats = PoolStats::new(5, 0, 1, true);
        assert_eq!(stats.to_string(), "0 available, 1 leased, capacity 5 (shut down)");
    }
}
