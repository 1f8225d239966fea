//! StorageBlock: fixed-capacity slot array plus its probe index.
//!
//! Shared between `StableMap` values behind an `Arc` until one of them
//! mutates. Positions of Active slots are never rewritten by anything in
//! this module except `remove_at` on that exact position.

use crate::probe_index::ProbeIndex;
use crate::slot::{Entry, Slot, Tag};
use core::borrow::Borrow;

/// Outcome of resolving a key against the block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Lookup {
    /// The key is Active at this position.
    Found(usize),
    /// The key is absent; an insertion belongs at this position (the
    /// first tombstone on the probe chain, or `end`).
    Vacant(usize),
}

#[derive(Debug)]
pub(crate) struct StorageBlock<K, V> {
    slots: Vec<Slot<K, V>>,
    count: usize,
    end: usize,
    index: ProbeIndex,
    #[cfg(test)]
    index_rebuilds: usize,
}

impl<K, V> StorageBlock<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self {
            slots,
            count: 0,
            end: 0,
            index: ProbeIndex::for_capacity(capacity),
            #[cfg(test)]
            index_rebuilds: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.end
    }

    /// Slots in `[0, end)`; everything past `end` is Empty.
    #[inline]
    pub(crate) fn live_slots(&self) -> &[Slot<K, V>] {
        &self.slots[..self.end]
    }

    #[inline]
    pub(crate) fn live_slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots[..self.end]
    }

    #[inline]
    pub(crate) fn entry(&self, position: usize) -> Option<&Entry<K, V>> {
        self.slots.get(position).and_then(Slot::entry)
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, position: usize) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(position).and_then(Slot::entry_mut)
    }

    /// Resolve `q` by walking the probe chain of `hash`.
    ///
    /// A chain entry pointing at a Tombstone does not end the walk: the
    /// key may still be Active further along. The first such tombstone
    /// becomes the insertion candidate.
    pub(crate) fn lookup<Q>(&self, hash: u64, q: &Q) -> Lookup
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let tag = Tag::active(hash);
        let mut reusable = None;
        for p in self.index.chain(hash) {
            match &self.slots[p] {
                Slot::Active(e) => {
                    if e.tag() == tag && e.key.borrow() == q {
                        return Lookup::Found(p);
                    }
                }
                Slot::Empty => break,
                Slot::Tombstone => {
                    if reusable.is_none() {
                        reusable = Some(p);
                    }
                }
            }
        }
        Lookup::Vacant(reusable.unwrap_or(self.end))
    }

    /// The next `insert_at` would have to rebuild the index while more
    /// than half the slots are live. Callers grow the block instead, so
    /// in-place rebuilds happen at most once per `capacity / 2` inserts.
    pub(crate) fn index_needs_growth(&self) -> bool {
        self.index.used() >= self.capacity() && self.count > self.capacity() / 2
    }

    /// Occupy a non-Active slot at `position < capacity`.
    pub(crate) fn insert_at(&mut self, position: usize, entry: Entry<K, V>) {
        assert!(
            position < self.capacity(),
            "insert position {position} out of capacity {}",
            self.capacity()
        );
        // Reused tombstones leave their stale index entries behind; make
        // room before the index would hold more entries than slots. Blocks
        // more than half full grow instead, see `index_needs_growth`.
        if self.index.used() >= self.capacity() {
            self.rebuild_index();
        }
        let hash = entry.hash;
        self.slots[position].occupy(entry);
        self.index.assign(position, hash);
        self.count += 1;
        if position == self.end {
            self.end += 1;
        }
        debug_assert!(self.count <= self.end && self.end <= self.capacity());
    }

    /// Turn the Active slot at `position` into a Tombstone. `end` is
    /// unchanged.
    pub(crate) fn remove_at(&mut self, position: usize) -> Option<Entry<K, V>> {
        let entry = self.slots.get_mut(position)?.vacate()?;
        self.count -= 1;
        Some(entry)
    }

    /// Tombstone every Active slot at or after `from` whose pair fails
    /// `keep`.
    pub(crate) fn retain_from<F>(&mut self, from: usize, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for slot in &mut self.slots[from.min(self.end)..self.end] {
            if let Slot::Active(e) = &*slot {
                if !keep(&e.key, &e.value) {
                    let _ = slot.vacate();
                    self.count -= 1;
                }
            }
        }
    }

    /// First Active position at or after `from`, or `end`.
    pub(crate) fn next_active(&self, from: usize) -> usize {
        (from..self.end)
            .find(|&p| self.slots[p].is_active())
            .unwrap_or(self.end)
    }

    /// Last Active position strictly before `before`.
    pub(crate) fn prev_active(&self, before: usize) -> Option<usize> {
        (0..before.min(self.end))
            .rev()
            .find(|&p| self.slots[p].is_active())
    }

    /// Reset every slot to Empty in place, keeping the allocation.
    pub(crate) fn wipe(&mut self) {
        log::trace!(
            "wiping storage block in place: capacity={} count={} end={}",
            self.capacity(),
            self.count,
            self.end
        );
        for slot in &mut self.slots[..self.end] {
            *slot = Slot::Empty;
        }
        self.count = 0;
        self.end = 0;
        self.index.clear();
    }

    /// Grow a uniquely owned block to `new_capacity` without moving any
    /// Active slot. Tombstones become Empty and the index is rebuilt at
    /// the new size.
    pub(crate) fn grow(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.capacity());
        log::trace!(
            "reallocating storage in place: capacity {} -> {} (count={} end={})",
            self.capacity(),
            new_capacity,
            self.count,
            self.end
        );
        for slot in &mut self.slots[..self.end] {
            if let Slot::Tombstone = slot {
                *slot = Slot::Empty;
            }
        }
        self.slots.resize_with(new_capacity, || Slot::Empty);
        self.index = ProbeIndex::for_capacity(new_capacity);
        for (p, slot) in self.slots[..self.end].iter().enumerate() {
            if let Slot::Active(e) = slot {
                self.index.assign(p, e.hash);
            }
        }
    }

    /// Re-derive the index from the Active slots only, dropping stale
    /// entries. Slots, tombstones included, are untouched.
    fn rebuild_index(&mut self) {
        log::trace!(
            "rebuilding probe index: {} entries used for {} live slots",
            self.index.used(),
            self.count
        );
        self.index.clear();
        for (p, slot) in self.slots[..self.end].iter().enumerate() {
            if let Slot::Active(e) = slot {
                self.index.assign(p, e.hash);
            }
        }
        #[cfg(test)]
        {
            self.index_rebuilds += 1;
        }
    }

    /// Take the slot array, truncated to `end`.
    pub(crate) fn into_slots(mut self) -> Vec<Slot<K, V>> {
        self.slots.truncate(self.end);
        self.slots
    }

    #[cfg(test)]
    pub(crate) fn index_used(&self) -> usize {
        self.index.used()
    }

    #[cfg(test)]
    pub(crate) fn index_rebuilds(&self) -> usize {
        self.index_rebuilds
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, position: usize) -> &Slot<K, V> {
        &self.slots[position]
    }
}

impl<K: Clone, V: Clone> StorageBlock<K, V> {
    /// Copy every Active slot into a fresh block of `new_capacity` slots
    /// at the same position. Tombstones are not carried over.
    pub(crate) fn reallocated(&self, new_capacity: usize) -> Self {
        assert!(
            new_capacity >= self.end,
            "reallocation to {new_capacity} slots would drop positions below end {}",
            self.end
        );
        log::trace!(
            "reallocating storage: capacity {} -> {} (count={} end={})",
            self.capacity(),
            new_capacity,
            self.count,
            self.end
        );
        let mut block = Self::with_capacity(new_capacity);
        for (p, slot) in self.slots[..self.end].iter().enumerate() {
            if let Slot::Active(e) = slot {
                block.slots[p] = Slot::Active(e.clone());
                block.index.assign(p, e.hash);
                block.count += 1;
            }
        }
        block.end = self.end;
        block
    }
}

impl<K: Clone, V: Clone> Clone for StorageBlock<K, V> {
    /// Copy-on-write detach: a same-capacity reallocation.
    fn clone(&self) -> Self {
        self.reallocated(self.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &'static str, value: i32, hash: u64) -> Entry<&'static str, i32> {
        Entry { key, value, hash }
    }

    fn insert(b: &mut StorageBlock<&'static str, i32>, key: &'static str, value: i32, hash: u64) -> usize {
        match b.lookup(hash, &key) {
            Lookup::Vacant(p) => {
                b.insert_at(p, entry(key, value, hash));
                p
            }
            Lookup::Found(p) => panic!("{key} already at {p}"),
        }
    }

    fn active_count(b: &StorageBlock<&'static str, i32>) -> usize {
        b.live_slots().iter().filter(|s| s.is_active()).count()
    }

    #[test]
    fn fresh_block_appends_at_end() {
        let mut b = StorageBlock::with_capacity(4);
        assert_eq!(insert(&mut b, "a", 1, 10), 0);
        assert_eq!(insert(&mut b, "b", 2, 20), 1);
        assert_eq!(insert(&mut b, "c", 3, 30), 2);
        assert_eq!((b.len(), b.end(), b.capacity()), (3, 3, 4));
        assert_eq!(b.lookup(20, &"b"), Lookup::Found(1));
        assert_eq!(b.lookup(40, &"d"), Lookup::Vacant(3));
    }

    #[test]
    fn tombstone_on_chain_is_the_insertion_candidate() {
        let mut b = StorageBlock::with_capacity(4);
        insert(&mut b, "a", 1, 10);
        insert(&mut b, "b", 2, 20);
        insert(&mut b, "c", 3, 30);
        let e = b.remove_at(1).expect("b active");
        assert_eq!((e.key, e.value), ("b", 2));
        assert_eq!((b.len(), b.end()), (2, 3));
        assert_eq!(b.slot(1).tag(), Tag::TOMBSTONE);
        assert_eq!(b.lookup(20, &"b"), Lookup::Vacant(1));
        assert_eq!(insert(&mut b, "b", 22, 20), 1);
        assert_eq!(b.end(), 3);
    }

    #[test]
    fn lookup_walks_past_tombstones_to_a_live_match() {
        let mut b = StorageBlock::with_capacity(8);
        // Same hash: all three share one probe chain.
        insert(&mut b, "a", 1, 5);
        insert(&mut b, "b", 2, 5);
        insert(&mut b, "c", 3, 5);
        b.remove_at(0);
        b.remove_at(1);
        assert_eq!(b.lookup(5, &"c"), Lookup::Found(2));
        assert_eq!(b.lookup(5, &"z"), Lookup::Vacant(0));
    }

    #[test]
    fn remove_at_rejects_non_active_positions() {
        let mut b: StorageBlock<&'static str, i32> = StorageBlock::with_capacity(2);
        assert!(b.remove_at(0).is_none());
        assert!(b.remove_at(5).is_none());
        insert(&mut b, "a", 1, 1);
        assert!(b.remove_at(0).is_some());
        assert!(b.remove_at(0).is_none());
    }

    #[test]
    fn churn_on_one_position_rebuilds_the_index() {
        let mut b = StorageBlock::with_capacity(2);
        insert(&mut b, "keep", 0, 3);
        for i in 0..50 {
            let p = insert(&mut b, "churn", i, 9);
            assert!(p <= 1);
            b.remove_at(p);
            assert!(b.index_used() <= b.capacity());
        }
        assert_eq!(b.lookup(3, &"keep"), Lookup::Found(0));
        assert_eq!(b.len(), 1);
        assert!(b.index_rebuilds() > 0);
        assert!(!b.index_needs_growth());
    }

    #[test]
    fn saturated_index_on_a_full_block_asks_for_growth() {
        let mut b = StorageBlock::with_capacity(4);
        for (i, k) in ["a", "b", "c"].into_iter().enumerate() {
            insert(&mut b, k, i as i32, i as u64 * 5);
        }
        assert!(!b.index_needs_growth());
        b.remove_at(1);
        assert_eq!(insert(&mut b, "b", 1, 5), 1);
        // The reuse left a stale entry: every index entry is used while
        // three of four slots are live.
        assert_eq!(b.index_used(), b.capacity());
        assert!(b.index_needs_growth());
        b.grow(8);
        assert!(!b.index_needs_growth());
        assert_eq!(b.index_used(), b.len());
        assert_eq!(b.lookup(5, &"b"), Lookup::Found(1));
        assert_eq!(b.index_rebuilds(), 0);
    }

    #[test]
    fn grow_preserves_positions_and_drops_tombstones() {
        let mut b = StorageBlock::with_capacity(4);
        for (i, k) in ["a", "b", "c", "d"].into_iter().enumerate() {
            insert(&mut b, k, i as i32, i as u64 * 7);
        }
        b.remove_at(2);
        b.grow(8);
        assert_eq!(b.capacity(), 8);
        assert_eq!((b.len(), b.end()), (3, 4));
        assert_eq!(b.lookup(0, &"a"), Lookup::Found(0));
        assert_eq!(b.lookup(7, &"b"), Lookup::Found(1));
        assert_eq!(b.lookup(21, &"d"), Lookup::Found(3));
        assert_eq!(b.slot(2).tag(), Tag::EMPTY);
        // The former tombstone is no longer reachable for reuse.
        assert_eq!(b.lookup(14, &"c"), Lookup::Vacant(4));
        assert_eq!(active_count(&b), b.len());
    }

    #[test]
    fn reallocated_copy_is_independent() {
        let mut b = StorageBlock::with_capacity(2);
        insert(&mut b, "a", 1, 1);
        insert(&mut b, "b", 2, 2);
        let mut c = b.clone();
        assert_eq!(c.capacity(), 2);
        c.entry_mut(0).expect("a").value = 100;
        c.remove_at(1);
        assert_eq!(b.entry(0).map(|e| e.value), Some(1));
        assert_eq!(b.len(), 2);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn wipe_resets_counters_and_index() {
        let mut b = StorageBlock::with_capacity(4);
        insert(&mut b, "a", 1, 1);
        insert(&mut b, "b", 2, 2);
        b.remove_at(0);
        b.wipe();
        assert_eq!((b.len(), b.end(), b.capacity()), (0, 0, 4));
        assert_eq!(b.index_used(), 0);
        assert_eq!(b.lookup(2, &"b"), Lookup::Vacant(0));
    }

    #[test]
    fn neighbour_scans_skip_inactive_slots() {
        let mut b = StorageBlock::with_capacity(8);
        for (i, k) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            insert(&mut b, k, i as i32, i as u64);
        }
        b.remove_at(0);
        b.remove_at(2);
        b.remove_at(3);
        assert_eq!(b.next_active(0), 1);
        assert_eq!(b.next_active(2), 4);
        assert_eq!(b.next_active(5), 5);
        assert_eq!(b.prev_active(4), Some(1));
        assert_eq!(b.prev_active(1), None);
        assert_eq!(b.prev_active(5), Some(4));
    }

    #[test]
    fn retain_tombstones_rejected_pairs() {
        let mut b = StorageBlock::with_capacity(4);
        for (i, k) in ["a", "b", "c", "d"].into_iter().enumerate() {
            insert(&mut b, k, i as i32, i as u64);
        }
        b.retain_from(0, |_, v| *v % 2 == 1);
        assert_eq!((b.len(), b.end()), (2, 4));
        assert_eq!(b.lookup(1, &"b"), Lookup::Found(1));
        assert_eq!(b.lookup(3, &"d"), Lookup::Found(3));
        assert_eq!(active_count(&b), 2);

        // Positions before `from` are not offered to the predicate.
        let mut offered = Vec::new();
        b.retain_from(2, |k, _| {
            offered.push(*k);
            false
        });
        assert_eq!(offered, vec!["d"]);
        assert_eq!(b.lookup(1, &"b"), Lookup::Found(1));
        assert_eq!(b.len(), 1);
    }
}
