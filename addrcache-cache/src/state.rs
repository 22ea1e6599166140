//! The guarded cache aggregate.
//!
//! `members`, `order` and `expirations` only ever change together, through
//! the compound operations below. Callers hold the cache mutex for the
//! duration of each call.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use addrcache_core::error::{CacheError, Result};
use addrcache_core::traits::CacheEntry;
use addrcache_core::types::CacheStats;

/// Position and deadline of a live entry.
#[derive(Clone, Copy, Debug)]
struct Slot {
    /// Offer sequence number; key into `order` and tiebreak in `expirations`.
    seq: u64,
    deadline: Option<Instant>,
}

/// Membership set, LIFO order and expiration index.
#[derive(Debug)]
pub(crate) struct CacheState<A> {
    /// Live entries → slot
    members: HashMap<A, Slot>,
    /// seq → entry, most recent last
    order: BTreeMap<u64, A>,
    /// (deadline, seq) → entry, earliest first
    expirations: BTreeMap<(Instant, u64), A>,
    next_seq: u64,
    closed: bool,
    offered_total: u64,
    evicted_total: u64,
}

impl<A: CacheEntry> CacheState<A> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            members: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            expirations: BTreeMap::new(),
            next_seq: 0,
            closed: false,
            offered_total: 0,
            evicted_total: 0,
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Inserts `address` at the most-recent position.
    ///
    /// A present entry is moved rather than duplicated; its deadline is
    /// replaced only when `deadline` is `Some`. Returns true if the entry
    /// was not already live.
    pub(crate) fn offer(&mut self, address: A, deadline: Option<Instant>) -> Result<bool> {
        self.ensure_open()?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.offered_total += 1;

        let inserted = match self.members.get_mut(&address) {
            Some(slot) => {
                self.order.remove(&slot.seq);
                if let Some(old) = slot.deadline {
                    self.expirations.remove(&(old, slot.seq));
                }
                slot.seq = seq;
                if deadline.is_some() {
                    slot.deadline = deadline;
                }
                if let Some(when) = slot.deadline {
                    self.expirations.insert((when, seq), address.clone());
                }
                false
            }
            None => {
                if let Some(when) = deadline {
                    self.expirations.insert((when, seq), address.clone());
                }
                self.members.insert(address.clone(), Slot { seq, deadline });
                true
            }
        };

        self.order.insert(seq, address);
        Ok(inserted)
    }

    pub(crate) fn remove(&mut self, address: &A) -> Result<bool> {
        self.ensure_open()?;

        match self.members.remove(address) {
            Some(slot) => {
                self.detach(slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes and returns the most recently offered entry.
    pub(crate) fn pop(&mut self) -> Result<Option<A>> {
        self.ensure_open()?;

        let Some((_, address)) = self.order.pop_last() else {
            return Ok(None);
        };
        if let Some(slot) = self.members.remove(&address) {
            self.detach(slot);
        }
        Ok(Some(address))
    }

    pub(crate) fn peek(&self) -> Option<A> {
        self.order.last_key_value().map(|(_, address)| address.clone())
    }

    pub(crate) fn contains(&self, address: &A) -> bool {
        self.members.contains_key(address)
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    /// Live entries, most recent first.
    pub(crate) fn snapshot(&self) -> Vec<A> {
        self.order.values().rev().cloned().collect()
    }

    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Scans from the earliest deadline and stops at the first one still in
    /// the future. Returns the evicted entries in deadline order.
    pub(crate) fn evict_expired(&mut self, now: Instant) -> Vec<A> {
        let mut evicted = Vec::new();

        while let Some(entry) = self.expirations.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, seq), address) = entry.remove_entry();

            // A record whose seq no longer matches the live slot is stale.
            if self.members.get(&address).is_some_and(|slot| slot.seq == seq) {
                self.members.remove(&address);
                self.order.remove(&seq);
                evicted.push(address);
            }
        }

        self.evicted_total += evicted.len() as u64;
        evicted
    }

    /// Marks the state closed and drops every entry.
    ///
    /// Returns the number of live entries cleared, or `None` if the state
    /// was already closed.
    pub(crate) fn close(&mut self) -> Option<usize> {
        if self.closed {
            return None;
        }
        self.closed = true;

        let cleared = self.members.len();
        self.members.clear();
        self.order.clear();
        self.expirations.clear();
        Some(cleared)
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            live_entries: self.members.len(),
            scheduled_expirations: self.expirations.len(),
            offered_total: self.offered_total,
            evicted_total: self.evicted_total,
            closed: self.closed,
        }
    }

    fn detach(&mut self, slot: Slot) {
        self.order.remove(&slot.seq);
        if let Some(when) = slot.deadline {
            self.expirations.remove(&(when, slot.seq));
        }
    }

    /// Checks that the three structures agree with each other.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.members.len(), self.order.len());
        for (address, slot) in &self.members {
            assert_eq!(self.order.get(&slot.seq), Some(address));
            if let Some(when) = slot.deadline {
                assert_eq!(self.expirations.get(&(when, slot.seq)), Some(address));
            }
        }
        let scheduled = self.members.values().filter(|s| s.deadline.is_some()).count();
        assert_eq!(self.expirations.len(), scheduled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn state() -> CacheState<&'static str> {
        CacheState::with_capacity(8)
    }

    #[test]
    fn test_empty_state() {
        let mut s = state();
        assert_eq!(s.len(), 0);
        assert_eq!(s.peek(), None);
        assert_eq!(s.pop().unwrap(), None);
        s.assert_consistent();
    }

    #[test]
    fn test_lifo_order() {
        let mut s = state();
        for address in ["a", "b", "c"] {
            assert!(s.offer(address, None).unwrap());
        }

        assert_eq!(s.peek(), Some("c"));
        assert_eq!(s.peek(), Some("c"));
        assert_eq!(s.pop().unwrap(), Some("c"));
        assert_eq!(s.pop().unwrap(), Some("b"));
        assert_eq!(s.pop().unwrap(), Some("a"));
        assert_eq!(s.pop().unwrap(), None);
        s.assert_consistent();
    }

    #[test]
    fn test_reoffer_moves_without_duplicating() {
        let mut s = state();
        s.offer("a", None).unwrap();
        s.offer("b", None).unwrap();
        assert!(!s.offer("a", None).unwrap());

        assert_eq!(s.len(), 2);
        assert_eq!(s.snapshot(), vec!["a", "b"]);
        s.assert_consistent();
    }

    #[test]
    fn test_remove_specific() {
        let mut s = state();
        s.offer("a", None).unwrap();
        s.offer("b", None).unwrap();

        assert!(s.remove(&"a").unwrap());
        assert!(!s.remove(&"a").unwrap());
        assert!(!s.remove(&"zzz").unwrap());
        assert_eq!(s.len(), 1);
        assert!(!s.contains(&"a"));
        s.assert_consistent();
    }

    #[test]
    fn test_evicts_in_deadline_order() {
        let base = Instant::now();
        let mut s = state();
        s.offer("late", Some(base + Duration::from_secs(20))).unwrap();
        s.offer("early", Some(base + Duration::from_secs(10))).unwrap();
        s.offer("forever", None).unwrap();

        assert!(s.evict_expired(base + Duration::from_secs(5)).is_empty());

        let first = s.evict_expired(base + Duration::from_secs(10));
        assert_eq!(first, vec!["early"]);
        assert!(s.contains(&"late"));

        let second = s.evict_expired(base + Duration::from_secs(60));
        assert_eq!(second, vec!["late"]);

        assert_eq!(s.snapshot(), vec!["forever"]);
        assert_eq!(s.stats().evicted_total, 2);
        s.assert_consistent();
    }

    #[test]
    fn test_reoffer_with_ttl_refreshes_deadline() {
        let base = Instant::now();
        let mut s = state();
        s.offer("a", Some(base + Duration::from_secs(1))).unwrap();
        s.offer("a", Some(base + Duration::from_secs(30))).unwrap();

        assert!(s.evict_expired(base + Duration::from_secs(10)).is_empty());
        assert!(s.contains(&"a"));
        assert_eq!(s.stats().scheduled_expirations, 1);
        s.assert_consistent();
    }

    #[test]
    fn test_reoffer_without_ttl_keeps_deadline() {
        let base = Instant::now();
        let mut s = state();
        s.offer("a", Some(base + Duration::from_secs(1))).unwrap();
        s.offer("b", None).unwrap();
        s.offer("a", None).unwrap();

        assert_eq!(s.peek(), Some("a"));
        assert_eq!(s.evict_expired(base + Duration::from_secs(2)), vec!["a"]);
        assert_eq!(s.peek(), Some("b"));
        s.assert_consistent();
    }

    #[test]
    fn test_pop_and_remove_drop_expiration_records() {
        let base = Instant::now();
        let mut s = state();
        s.offer("a", Some(base + Duration::from_secs(1))).unwrap();
        s.offer("b", Some(base + Duration::from_secs(1))).unwrap();

        s.pop().unwrap();
        s.remove(&"a").unwrap();

        assert_eq!(s.stats().scheduled_expirations, 0);
        assert!(s.evict_expired(base + Duration::from_secs(5)).is_empty());
        s.assert_consistent();
    }

    #[test]
    fn test_close_is_final() {
        let mut s = state();
        s.offer("a", None).unwrap();
        s.offer("b", None).unwrap();

        assert_eq!(s.close(), Some(2));
        assert_eq!(s.close(), None);

        assert_eq!(s.len(), 0);
        assert_eq!(s.peek(), None);
        assert!(matches!(s.offer("c", None), Err(CacheError::Closed)));
        assert!(matches!(s.remove(&"a"), Err(CacheError::Closed)));
        assert!(matches!(s.pop(), Err(CacheError::Closed)));
        assert!(s.stats().closed);
        s.assert_consistent();
    }

    #[derive(Clone, Debug)]
    enum Op {
        Offer(u8),
        Remove(u8),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::Offer),
            (0u8..8).prop_map(Op::Remove),
            Just(Op::Pop),
        ]
    }

    proptest! {
        /// The state behaves like a stack of unique values.
        #[test]
        fn prop_matches_unique_stack_model(ops in proptest::collection::vec(op(), 0..64)) {
            let mut s: CacheState<u8> = CacheState::with_capacity(8);
            let mut model: Vec<u8> = Vec::new();

            for op in ops {
                match op {
                    Op::Offer(v) => {
                        let fresh = !model.contains(&v);
                        model.retain(|m| *m != v);
                        model.push(v);
                        prop_assert_eq!(s.offer(v, None).unwrap(), fresh);
                    }
                    Op::Remove(v) => {
                        let present = model.contains(&v);
                        model.retain(|m| *m != v);
                        prop_assert_eq!(s.remove(&v).unwrap(), present);
                    }
                    Op::Pop => {
                        prop_assert_eq!(s.pop().unwrap(), model.pop());
                    }
                }
                prop_assert_eq!(s.len(), model.len());
                prop_assert_eq!(s.peek(), model.last().copied());
            }

            let expected: Vec<u8> = model.iter().rev().copied().collect();
            prop_assert_eq!(s.snapshot(), expected);
            s.assert_consistent();
        }
    }
}
