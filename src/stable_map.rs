//! StableMap: position-stable hash dictionary with copy-on-write storage.

use crate::slot::{Entry, Slot};
use crate::storage::{Lookup, StorageBlock};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use core::iter::FusedIterator;
use hashbrown::hash_map::DefaultHashBuilder;
use std::sync::Arc;

/// Error returned by [`StableMap::try_from_unique_pairs`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InsertError {
    /// The key is already Active at `position`.
    DuplicateKey { position: usize },
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey { position } => {
                write!(f, "duplicate key: already present at position {position}")
            }
        }
    }
}

impl std::error::Error for InsertError {}

/// A hash map whose entries keep their position for as long as they are
/// present.
///
/// Positions are plain `usize` indices in `[0, end_index())`. Inserting
/// or removing other keys, and growing the capacity, never moves an
/// entry. Removing a key leaves a tombstone at its position; the next
/// insertion that probes through it reuses it.
///
/// Cloning is O(1): clones share storage until one of them mutates, at
/// which point the writer takes a private copy. Mutating methods
/// therefore require `K: Clone` and `V: Clone`.
///
/// Equality, hashing and formatting follow position order.
pub struct StableMap<K, V, S = DefaultHashBuilder> {
    storage: Option<Arc<StorageBlock<K, V>>>,
    hasher: S,
}

impl<K, V> StableMap<K, V> {
    /// An empty map. Does not allocate.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// An empty map able to hold at least `capacity` entries without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for StableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: Clone> Clone for StableMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<K, V, S> StableMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            storage: None,
            hasher,
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let mut map = Self::with_hasher(hasher);
        map.reserve_unique(capacity);
        map
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.storage.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of positions available before the next reallocation.
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().map_or(0, |b| b.capacity())
    }

    /// The first Active position, or `end_index()` when empty.
    pub fn start_index(&self) -> usize {
        self.storage.as_ref().map_or(0, |b| b.next_active(0))
    }

    /// One past the highest position ever assigned since the last
    /// `remove_all`.
    pub fn end_index(&self) -> usize {
        self.storage.as_ref().map_or(0, |b| b.end())
    }

    /// The next Active position after `position`, or `end_index()`.
    ///
    /// # Panics
    /// If `position >= end_index()`.
    pub fn index_after(&self, position: usize) -> usize {
        let end = self.end_index();
        assert!(
            position < end,
            "index_after: position {position} out of range (end {end})"
        );
        self.storage
            .as_ref()
            .map_or(end, |b| b.next_active(position + 1))
    }

    /// The previous Active position before `position`.
    ///
    /// # Panics
    /// If `position > end_index()` or no Active position precedes it.
    pub fn index_before(&self, position: usize) -> usize {
        let end = self.end_index();
        assert!(
            position <= end,
            "index_before: position {position} out of range (end {end})"
        );
        match self.storage.as_ref().and_then(|b| b.prev_active(position)) {
            Some(p) => p,
            None => panic!("index_before: no element before position {position}"),
        }
    }

    /// Key and value at `position`, if that position is Active.
    pub fn get_at(&self, position: usize) -> Option<(&K, &V)> {
        let e = self.storage.as_ref()?.entry(position)?;
        Some((&e.key, &e.value))
    }

    /// Key and value at `position`.
    ///
    /// # Panics
    /// If `position` does not hold an element.
    pub fn at(&self, position: usize) -> (&K, &V) {
        match self.get_at(position) {
            Some(kv) => kv,
            None => panic!("no element at position {position}"),
        }
    }

    /// Active positions in ascending order.
    pub fn positions(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.slots()
            .iter()
            .enumerate()
            .filter_map(|(p, s)| s.is_active().then_some(p))
    }

    /// Pairs in ascending position order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots().iter(),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Drop every entry. With `keep_capacity` the allocation is kept
    /// (reset in place when unshared, replaced by a fresh block of the
    /// same capacity when shared); otherwise storage is released.
    pub fn remove_all(&mut self, keep_capacity: bool) {
        if !keep_capacity {
            self.storage = None;
            return;
        }
        if let Some(arc) = self.storage.as_mut() {
            let capacity = arc.capacity();
            match Arc::get_mut(arc) {
                Some(block) => block.wipe(),
                None => {
                    log::trace!("remove_all on shared storage: detaching to a fresh block of {capacity}");
                    *arc = Arc::new(StorageBlock::with_capacity(capacity));
                }
            }
        }
    }

    fn slots(&self) -> &[Slot<K, V>] {
        match &self.storage {
            Some(b) => b.live_slots(),
            None => &[],
        }
    }

    pub(crate) fn shares_storage_with(&self, other: &Self) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Grow storage this value owns outright to `new_capacity`, or
    /// allocate it. Returns `false`, doing nothing, when the storage is
    /// shared.
    fn grow_unique(&mut self, new_capacity: usize) -> bool {
        match self.storage.as_mut() {
            None => {
                self.storage = Some(Arc::new(StorageBlock::with_capacity(new_capacity)));
                true
            }
            Some(arc) => match Arc::get_mut(arc) {
                Some(block) => {
                    block.grow(new_capacity);
                    true
                }
                None => false,
            },
        }
    }

    /// See [`StableMap::reserve_capacity`]; only used for maps that own
    /// their storage outright.
    fn reserve_unique(&mut self, min: usize) {
        if let Some(new_capacity) = next_capacity(self.capacity(), min) {
            let grown = self.grow_unique(new_capacity);
            debug_assert!(grown, "fresh map storage is never shared");
        }
    }
}

/// Doubling from `max(1, capacity)` until at least `min`, or `None`
/// when `capacity` already suffices.
fn next_capacity(capacity: usize, min: usize) -> Option<usize> {
    if capacity >= min {
        return None;
    }
    let mut new_capacity = capacity.max(1);
    while new_capacity < min {
        new_capacity = match new_capacity.checked_mul(2) {
            Some(c) => c,
            None => panic!("capacity overflow"),
        };
    }
    Some(new_capacity)
}

impl<K, V, S> StableMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn lookup<Q>(&self, hash: u64, q: &Q) -> Lookup
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        match &self.storage {
            Some(b) => b.lookup(hash, q),
            None => Lookup::Vacant(0),
        }
    }

    /// Current position of `q`, if present.
    pub fn index_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.lookup(self.make_hash(q), q) {
            Lookup::Found(p) => Some(p),
            Lookup::Vacant(_) => None,
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index_of(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let p = self.index_of(q)?;
        self.get_at(p)
    }
}

impl<K, V, S> StableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Build a map from pairs whose keys must be distinct. Positions
    /// follow iteration order.
    ///
    /// # Panics
    /// On the first duplicate key.
    pub fn from_unique_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        match Self::try_from_unique_pairs(pairs) {
            Ok(map) => map,
            Err(e) => panic!("from_unique_pairs: {e}"),
        }
    }

    /// Like [`StableMap::from_unique_pairs`], reporting the first
    /// duplicate key as an error instead of panicking.
    pub fn try_from_unique_pairs<I>(pairs: I) -> Result<Self, InsertError>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        let pairs = pairs.into_iter();
        let mut map = Self::with_hasher(S::default());
        map.reserve_unique(pairs.size_hint().0);
        for (key, value) in pairs {
            let hash = map.make_hash(&key);
            match map.lookup(hash, &key) {
                Lookup::Found(position) => return Err(InsertError::DuplicateKey { position }),
                Lookup::Vacant(p) => map.insert_vacant(p, hash, key, value),
            }
        }
        Ok(map)
    }

    /// Storage with this value as its sole owner, copying shared storage
    /// first.
    fn make_unique(&mut self) -> Option<&mut StorageBlock<K, V>> {
        let arc = self.storage.as_mut()?;
        if Arc::get_mut(arc).is_none() {
            log::trace!(
                "detaching shared storage: capacity={} count={}",
                arc.capacity(),
                arc.len()
            );
        }
        Some(Arc::make_mut(arc))
    }

    /// Grow to at least `min` positions, doubling from
    /// `max(1, capacity())`. Every Active entry keeps its position.
    pub fn reserve_capacity(&mut self, min: usize) {
        let Some(new_capacity) = next_capacity(self.capacity(), min) else {
            return;
        };
        if !self.grow_unique(new_capacity) {
            if let Some(arc) = self.storage.as_mut() {
                *arc = Arc::new(arc.reallocated(new_capacity));
            }
        }
    }

    fn insert_vacant(&mut self, position: usize, hash: u64, key: K, value: V) {
        if position >= self.end_index() {
            let min = (self.len() + 1).max(position + 1);
            self.reserve_capacity(min);
        } else if self
            .storage
            .as_ref()
            .is_some_and(|b| Arc::strong_count(b) == 1 && b.index_needs_growth())
        {
            // Reusing a tombstone in a mostly full block: doubling keeps
            // every position and drops the stale index entries. Shared
            // blocks get a fresh index when they detach.
            self.reserve_capacity(self.capacity() + 1);
        }
        let block = self
            .make_unique()
            .expect("storage must exist after reserving room for an insert");
        block.insert_at(position, Entry { key, value, hash });
    }

    /// Insert or overwrite, reporting whether a new entry was created
    /// and the position it lives at. Overwriting keeps the position.
    pub fn assign_value(&mut self, key: K, value: V) -> (bool, usize) {
        let hash = self.make_hash(&key);
        match self.lookup(hash, &key) {
            Lookup::Found(p) => {
                let block = self
                    .make_unique()
                    .expect("a found key implies allocated storage");
                if let Some(e) = block.entry_mut(p) {
                    e.value = value;
                }
                (false, p)
            }
            Lookup::Vacant(p) => {
                self.insert_vacant(p, hash, key, value);
                (true, p)
            }
        }
    }

    /// Insert `key` unless present. Returns whether it was inserted and
    /// the position it occupies either way. A present key is left as is
    /// and shared storage is not detached.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> (bool, usize) {
        let hash = self.make_hash(&key);
        match self.lookup(hash, &key) {
            Lookup::Found(p) => (false, p),
            Lookup::Vacant(p) => {
                self.insert_vacant(p, hash, key, value);
                (true, p)
            }
        }
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        match self.lookup(hash, &key) {
            Lookup::Found(p) => {
                let block = self
                    .make_unique()
                    .expect("a found key implies allocated storage");
                block
                    .entry_mut(p)
                    .map(|e| core::mem::replace(&mut e.value, value))
            }
            Lookup::Vacant(p) => {
                self.insert_vacant(p, hash, key, value);
                None
            }
        }
    }

    /// Keyed subscript assignment: `Some(value)` inserts or overwrites,
    /// `None` removes. Returns the previous value.
    pub fn set(&mut self, key: K, value: Option<V>) -> Option<V> {
        match value {
            Some(v) => self.insert(key, v),
            None => self.remove(&key),
        }
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let p = self.index_of(q)?;
        self.get_mut_at(p).map(|(_, v)| v)
    }

    /// Key and mutable value at `position`, if that position is Active.
    pub fn get_mut_at(&mut self, position: usize) -> Option<(&K, &mut V)> {
        if self.get_at(position).is_none() {
            return None;
        }
        let e = self.make_unique()?.entry_mut(position)?;
        Some((&e.key, &mut e.value))
    }

    /// Remove the entry at `position`, leaving a tombstone.
    ///
    /// # Panics
    /// If `position` does not hold an element.
    pub fn remove_at(&mut self, position: usize) -> (K, V) {
        if self.get_at(position).is_none() {
            panic!("remove_at: no element at position {position}");
        }
        let e = self
            .make_unique()
            .and_then(|b| b.remove_at(position))
            .expect("position checked active above");
        (e.key, e.value)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let p = self.index_of(q)?;
        Some(self.remove_at(p))
    }

    /// Remove every entry for which `keep` returns `false`. Kept entries
    /// keep their positions. `keep` runs once per entry, in position
    /// order; shared storage is only detached once an entry is rejected.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let rejected = self.slots().iter().position(|slot| match slot {
            Slot::Active(e) => !keep(&e.key, &e.value),
            _ => false,
        });
        let Some(p) = rejected else {
            return;
        };
        let block = self
            .make_unique()
            .expect("a rejected entry implies allocated storage");
        block.remove_at(p);
        block.retain_from(p + 1, keep);
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        let slots: &mut [Slot<K, V>] = match self.make_unique() {
            Some(b) => b.live_slots_mut(),
            None => &mut [],
        };
        IterMut {
            slots: slots.iter_mut(),
            remaining,
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

/// Iterator over `(&K, &V)` in ascending position order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in ascending position order.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator in ascending position order.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((e.key, e.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.next_back() {
            if let Slot::Active(e) = slot {
                self.remaining -= 1;
                return Some((e.key, e.value));
            }
        }
        None
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for ValuesMut<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a mut V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a StableMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut StableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K: Clone, V: Clone, S> IntoIterator for StableMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        let slots = match self.storage {
            Some(arc) => Arc::unwrap_or_clone(arc).into_slots(),
            None => Vec::new(),
        };
        IntoIter {
            slots: slots.into_iter(),
            remaining,
        }
    }
}

/// Collects with the unique-keys contract of
/// [`StableMap::from_unique_pairs`].
///
/// # Panics
/// On a duplicate key.
impl<K, V, S> FromIterator<(K, V)> for StableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_unique_pairs(iter)
    }
}

/// Inserts with [`StableMap::insert`] semantics: existing keys are
/// overwritten in place.
impl<K, V, S> Extend<(K, V)> for StableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> PartialEq for StableMap<K, V, S>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if self.shares_storage_with(other) {
            return true;
        }
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for StableMap<K, V, S> {}

impl<K: Hash, V: Hash, S> Hash for StableMap<K, V, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for (k, v) in self.iter() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for StableMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k:?}: {v:?}")?;
        }
        f.write_str("]")
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for StableMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("]")
    }
}
