use std::fmt;

/// Identifies one item within the pool that created it.
///
/// Items are numbered in construction order, starting from zero, and keep their identity for
/// the lifetime of the pool no matter how many times they are leased and returned.
///
/// Identities are only meaningful within a single pool. Two pools both have an item `#0`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ItemId(usize);

impl ItemId {
    #[must_use]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The zero-based construction index of the item.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of one item owned by a pool.
///
/// Every item starts out [`Available`](Self::Available) and moves between
/// [`Available`](Self::Available) and [`Leased`](Self::Leased) as it is acquired and returned.
/// Once the pool shuts down, items become [`Destroyed`](Self::Destroyed) - immediately if they
/// are in the pool at that point, or when their lease ends otherwise.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ItemState {
    /// The item is in the pool, waiting to be acquired.
    Available,

    /// The item is exclusively owned by the holder of a [`Lease`][crate::Lease].
    Leased,

    /// The item has been dropped because the pool shut down.
    Destroyed,
}
