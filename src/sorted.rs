//! Sorted containers backed by a `Vec` and binary search.
//!
//! No hashing and no position stability: an insertion shifts every later
//! element by one.

use core::borrow::Borrow;
use core::ops::Index;

/// Ascending `Vec`. Equal elements are allowed and kept in insertion
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortedArray<T> {
    items: Vec<T>,
}

impl<T: Ord> SortedArray<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// First index whose element is not less than `probe`.
    pub fn insertion_point(&self, probe: &T) -> usize {
        self.items.partition_point(|e| e < probe)
    }

    /// Insert after any equal elements; returns the index used.
    pub fn insert(&mut self, value: T) -> usize {
        let at = self.items.partition_point(|e| e <= &value);
        self.items.insert(at, value);
        at
    }

    /// Index of the first element equal to `probe`.
    pub fn index_of(&self, probe: &T) -> Option<usize> {
        let at = self.insertion_point(probe);
        (self.items.get(at) == Some(probe)).then_some(at)
    }

    pub fn contains(&self, probe: &T) -> bool {
        self.index_of(probe).is_some()
    }

    /// Remove the first element equal to `probe`.
    pub fn remove(&mut self, probe: &T) -> Option<T> {
        let at = self.index_of(probe)?;
        Some(self.items.remove(at))
    }
}

impl<T> SortedArray<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// # Panics
    /// If `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear()
    }
}

impl<T> Index<usize> for SortedArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: Ord> FromIterator<T> for SortedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        // Stable sort keeps equal elements in arrival order.
        items.sort();
        Self { items }
    }
}

impl<'a, T> IntoIterator for &'a SortedArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for SortedArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Map with unique keys kept in ascending key order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for SortedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Ord, V> SortedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn search<Q>(&self, q: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.entries.binary_search_by(|(k, _)| k.borrow().cmp(q))
    }

    /// Insert or overwrite, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            Ok(at) => Some(core::mem::replace(&mut self.entries[at].1, value)),
            Err(at) => {
                self.entries.insert(at, (key, value));
                None
            }
        }
    }

    /// Sorted index of `q`, if present.
    pub fn index_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(q).ok()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let at = self.index_of(q)?;
        Some(&self.entries[at].1)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let at = self.index_of(q)?;
        Some(&mut self.entries[at].1)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.index_of(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let at = self.index_of(q)?;
        Some(self.entries.remove(at).1)
    }
}

impl<K, V> SortedMap<K, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}

/// Later pairs overwrite earlier ones with the same key.
impl<K: Ord, V> FromIterator<(K, V)> for SortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Set of unique elements kept in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortedSet<T> {
    map: SortedMap<T, ()>,
}

impl<T> Default for SortedSet<T> {
    fn default() -> Self {
        Self {
            map: SortedMap::default(),
        }
    }
}

impl<T: Ord> SortedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the element was already present.
    pub fn insert(&mut self, value: T) -> bool {
        match self.map.search(&value) {
            Ok(_) => false,
            Err(at) => {
                self.map.entries.insert(at, (value, ()));
                true
            }
        }
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.map.remove(q).is_some()
    }
}

impl<T> SortedSet<T> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.map.keys()
    }
}

impl<T: Ord> FromIterator<T> for SortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}
