//! StableSet: key-only projection of `StableMap<T, ()>`.

use crate::stable_map::{self, StableMap};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// A hash set whose elements keep their position for as long as they
/// are present. See [`StableMap`] for the position and copy-on-write
/// contract.
pub struct StableSet<T, S = DefaultHashBuilder> {
    map: StableMap<T, (), S>,
}

impl<T> StableSet<T> {
    pub fn new() -> Self {
        Self {
            map: StableMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: StableMap::with_capacity(capacity),
        }
    }
}

impl<T> Default for StableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Clone> Clone for StableSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T, S> StableSet<T, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: StableMap::with_hasher(hasher),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            map: StableMap::with_capacity_and_hasher(capacity, hasher),
        }
    }

    pub fn hasher(&self) -> &S {
        self.map.hasher()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn start_index(&self) -> usize {
        self.map.start_index()
    }

    pub fn end_index(&self) -> usize {
        self.map.end_index()
    }

    /// # Panics
    /// If `position >= end_index()`.
    pub fn index_after(&self, position: usize) -> usize {
        self.map.index_after(position)
    }

    /// # Panics
    /// If `position > end_index()` or no element precedes it.
    pub fn index_before(&self, position: usize) -> usize {
        self.map.index_before(position)
    }

    pub fn get_at(&self, position: usize) -> Option<&T> {
        self.map.get_at(position).map(|(k, _)| k)
    }

    pub fn positions(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.map.positions()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.keys(),
        }
    }

    pub fn remove_all(&mut self, keep_capacity: bool) {
        self.map.remove_all(keep_capacity)
    }
}

impl<T, S> StableSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }

    /// Position of `q`, if present.
    pub fn first_index_of<Q>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.index_of(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get_key_value(q).map(|(k, _)| k)
    }
}

impl<T, S> StableSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Insert `value` unless present. Returns whether it was inserted
    /// and the position it occupies either way.
    pub fn insert(&mut self, value: T) -> (bool, usize) {
        self.map.insert_if_absent(value, ())
    }

    /// Remove `q`, returning the stored element.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove_entry(q).map(|(k, _)| k)
    }

    /// # Panics
    /// If `position` does not hold an element.
    pub fn remove_at(&mut self, position: usize) -> T {
        self.map.remove_at(position).0
    }

    pub fn reserve_capacity(&mut self, min: usize) {
        self.map.reserve_capacity(min)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.map.retain(|k, _| f(k))
    }
}

/// # Panics
/// If `position` does not hold an element.
impl<T, S> Index<usize> for StableSet<T, S> {
    type Output = T;

    fn index(&self, position: usize) -> &T {
        self.map.at(position).0
    }
}

pub struct Iter<'a, T> {
    inner: stable_map::Keys<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IntoIter<T> {
    inner: stable_map::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<'a, T, S> IntoIterator for &'a StableSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone, S> IntoIterator for StableSet<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

/// Duplicates are dropped; the first occurrence fixes the position.
impl<T, S> FromIterator<T> for StableSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for StableSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<T: PartialEq, S> PartialEq for StableSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq, S> Eq for StableSet<T, S> {}

impl<T: Hash, S> Hash for StableSet<T, S> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.map.hash(state)
    }
}

impl<T: fmt::Debug, S> fmt::Debug for StableSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, e) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e:?}")?;
        }
        f.write_str("]")
    }
}

impl<T: fmt::Display, S> fmt::Display for StableSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, e) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_existing_position() {
        let mut s: StableSet<&str> = StableSet::new();
        assert_eq!(s.insert("x"), (true, 0));
        assert_eq!(s.insert("y"), (true, 1));
        assert_eq!(s.insert("x"), (false, 0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn inserting_a_present_element_keeps_storage_shared() {
        let a: StableSet<i32> = (0..4).collect();
        let mut b = a.clone();
        assert_eq!(b.insert(2), (false, 2));
        assert!(a.map.shares_storage_with(&b.map));
        assert_eq!(b.insert(9), (true, 4));
        assert!(!a.map.shares_storage_with(&b.map));
        assert!(!a.contains(&9));
    }

    #[test]
    fn from_iter_deduplicates_keeping_first_position() {
        let s: StableSet<i32> = [3, 1, 3, 2, 1].into_iter().collect();
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(s.first_index_of(&2), Some(2));
        assert_eq!(s[1], 1);
    }

    #[test]
    fn remove_and_reinsert_reuses_position() {
        let mut s: StableSet<String> = ["a", "b", "c"].iter().map(|x| x.to_string()).collect();
        assert_eq!(s.remove("b"), Some("b".to_string()));
        assert!(!s.contains("b"));
        assert_eq!(s.insert("b".to_string()), (true, 1));
        assert_eq!(s.get("b").map(String::as_str), Some("b"));
    }

    #[test]
    fn rendering_uses_brackets() {
        let mut s: StableSet<&str> = ["p", "q"].into_iter().collect();
        assert_eq!(s.to_string(), "[p, q]");
        assert_eq!(format!("{s:?}"), "[\"p\", \"q\"]");
        s.remove_all(true);
        assert_eq!(s.to_string(), "[]");
    }

    #[test]
    fn equality_is_position_ordered() {
        let a: StableSet<i32> = [1, 2].into_iter().collect();
        let b: StableSet<i32> = [2, 1].into_iter().collect();
        let c: StableSet<i32> = [1, 2].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn retain_and_remove_at() {
        let mut s: StableSet<i32> = (0..6).collect();
        s.retain(|v| v % 2 == 0);
        assert_eq!(s.positions().collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(s.remove_at(2), 2);
        assert_eq!(s.iter().rev().copied().collect::<Vec<_>>(), vec![4, 0]);
        assert_eq!(s.into_iter().collect::<Vec<_>>(), vec![0, 4]);
    }
}
