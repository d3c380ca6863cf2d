use std::collections::VecDeque;
use std::mem;

use crate::{ItemId, ItemState, PoolStats};

/// The mutable bookkeeping of a pool, always accessed under the pool lock.
///
/// This type only moves items between its queue and its callers. It never drops an item itself:
/// items that must be destroyed are handed back to the caller, who drops them after releasing
/// the lock so that item destructors never run inside the critical section.
#[derive(Debug)]
pub(crate) struct PoolState<T> {
    // Items ready to be leased. Taken from the front, returned to the back.
    available: VecDeque<(ItemId, T)>,

    // Owned/free tag of every item ever created by the pool, indexed by `ItemId::index()`.
    item_states: Vec<ItemState>,

    leased: usize,
    is_shut_down: bool,
}

impl<T> PoolState<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        let item_states = vec![ItemState::Available; items.len()];

        let available = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (ItemId::new(index), item))
            .collect();

        Self {
            available,
            item_states,
            leased: 0,
            is_shut_down: false,
        }
    }

    /// Removes the least recently returned item from the pool and marks it leased.
    ///
    /// Returns `None` if no item is available, which is always the case after shutdown.
    pub(crate) fn take(&mut self) -> Option<(ItemId, T)> {
        let (id, item) = self.available.pop_front()?;

        self.transition(id, ItemState::Available, ItemState::Leased);
        self.leased = self
            .leased
            .checked_add(1)
            .expect("leased count is bounded by the number of items, so cannot overflow");

        Some((id, item))
    }

    /// Ends the lease of an item.
    ///
    /// If the pool is still running, the item re-enters the back of the queue and `None` is
    /// returned. If the pool has shut down, the item is marked destroyed and handed back to
    /// the caller to drop.
    ///
    /// # Panics
    ///
    /// Panics if the item is not currently leased. This indicates the same item was returned
    /// twice or an identity from another pool was used, both of which the public API prevents.
    pub(crate) fn put_back(&mut self, id: ItemId, item: T) -> Option<T> {
        self.leased = self
            .leased
            .checked_sub(1)
            .expect("an item was returned while no leases were outstanding");

        if self.is_shut_down {
            self.transition(id, ItemState::Leased, ItemState::Destroyed);
            return Some(item);
        }

        self.transition(id, ItemState::Leased, ItemState::Available);
        self.available.push_back((id, item));

        None
    }

    /// Marks the pool as shut down and removes every available item, marking it destroyed.
    ///
    /// Returns `None` if the pool had already been shut down before this call.
    pub(crate) fn shut_down(&mut self) -> Option<Vec<T>> {
        if self.is_shut_down {
            return None;
        }

        self.is_shut_down = true;

        let drained = mem::take(&mut self.available);
        let mut destroyed = Vec::with_capacity(drained.len());

        for (id, item) in drained {
            self.transition(id, ItemState::Available, ItemState::Destroyed);
            destroyed.push(item);
        }

        Some(destroyed)
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.is_shut_down
    }

    #[cfg(test)]
    pub(crate) fn has_available(&self) -> bool {
        !self.available.is_empty()
    }

    pub(crate) fn leased(&self) -> usize {
        self.leased
    }

    pub(crate) fn item_state(&self, id: ItemId) -> Option<ItemState> {
        self.item_states.get(id.index()).copied()
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats::new(
            self.item_states.len(),
            self.available.len(),
            self.leased,
            self.is_shut_down,
        )
    }

    fn transition(&mut self, id: ItemId, from: ItemState, to: ItemState) {
        let state = self
            .item_states
            .get_mut(id.index())
            .expect("item identity must belong to this pool");

        assert!(
            *state == from,
            "item {id} was expected to be {from:?} but was {state:?} - it cannot become {to:?}"
        );

        *state = to;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn state_of(count: usize) -> PoolState<String> {
        PoolState::new((0..count).map(|i| format!("item {i}")).collect())
    }

    #[test]
    fn new_state_has_all_items_available() {
        let state = state_of(3);

        let stats = state.stats();
        assert_eq!(stats.capacity(), 3);
        assert_eq!(stats.available(), 3);
        assert_eq!(stats.leased(), 0);
        assert!(!stats.is_shut_down());

        for index in 0..3 {
            assert_eq!(
                state.item_state(ItemId::new(index)),
                Some(ItemState::Available)
            );
        }
    }

    #[test]
    fn take_is_first_in_first_out() {
        let mut state = state_of(3);

        let (first_id, first) = state.take().unwrap();
        let (second_id, second) = state.take().unwrap();

        assert_eq!(first_id, ItemId::new(0));
        assert_eq!(first, "item 0");
        assert_eq!(second_id, ItemId::new(1));
        assert_eq!(second, "item 1");

        // The returned item goes to the back, behind the item that was never taken.
        assert!(state.put_back(first_id, first).is_none());

        let (next_id, _) = state.take().unwrap();
        assert_eq!(next_id, ItemId::new(2));

        let (next_id, next) = state.take().unwrap();
        assert_eq!(next_id, ItemId::new(0));
        assert_eq!(next, "item 0");
    }

    #[test]
    fn take_from_empty_returns_none() {
        let mut state = state_of(1);

        let _taken = state.take().unwrap();
        assert!(state.take().is_none());
        assert!(!state.has_available());
    }

    #[test]
    fn counts_always_add_up_to_capacity() {
        let mut state = state_of(4);
        let mut held = Vec::new();

        for _ in 0..4 {
            held.push(state.take().unwrap());

            let stats = state.stats();
            assert_eq!(stats.available() + stats.leased(), 4);
        }

        for (id, item) in held {
            assert!(state.put_back(id, item).is_none());

            let stats = state.stats();
            assert_eq!(stats.available() + stats.leased(), 4);
        }

        assert_eq!(state.stats().available(), 4);
    }

    #[test]
    fn item_states_follow_lease_lifecycle() {
        let mut state = state_of(2);

        let (id, item) = state.take().unwrap();
        assert_eq!(state.item_state(id), Some(ItemState::Leased));

        assert!(state.put_back(id, item).is_none());
        assert_eq!(state.item_state(id), Some(ItemState::Available));
    }

    #[test]
    fn unknown_item_has_no_state() {
        let state = state_of(2);
        assert_eq!(state.item_state(ItemId::new(2)), None);
    }

    #[test]
    fn shut_down_drains_available_items() {
        let mut state = state_of(3);

        let (leased_id, leased_item) = state.take().unwrap();

        let destroyed = state.shut_down().unwrap();
        assert_eq!(destroyed, vec!["item 1".to_string(), "item 2".to_string()]);

        assert!(state.is_shut_down());
        assert!(!state.has_available());
        assert_eq!(state.leased(), 1);
        assert_eq!(state.item_state(ItemId::new(1)), Some(ItemState::Destroyed));
        assert_eq!(state.item_state(leased_id), Some(ItemState::Leased));

        // Returning after shutdown hands the item back for destruction.
        let rejected = state.put_back(leased_id, leased_item);
        assert_eq!(rejected.as_deref(), Some("item 0"));
        assert_eq!(state.item_state(leased_id), Some(ItemState::Destroyed));
        assert_eq!(state.leased(), 0);
        assert!(state.take().is_none());
    }

    #[test]
    fn shut_down_twice_reports_already_shut_down() {
        let mut state = state_of(1);

        assert!(state.shut_down().is_some());
        assert!(state.shut_down().is_none());
    }

    #[test]
    #[should_panic]
    fn put_back_of_available_item_panics() {
        let mut state = state_of(2);

        let (id, item) = state.take().unwrap();
        assert!(state.put_back(id, item.clone()).is_none());

        // Second return of the same identity while other leases are outstanding.
        let _other = state.take().unwrap();
        state.put_back(id, item);
    }

    #[test]
    #[should_panic]
    fn put_back_without_leases_panics() {
        let mut state = state_of(1);
        state.put_back(ItemId::new(0), "intruder".to_string());
    }
}
