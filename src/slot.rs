//! Slot: per-position storage cell with a one-byte occupancy tag.

/// One-byte occupancy tag.
///
/// Active tags carry the top 7 bits of the entry's hash and therefore
/// always have the high bit clear. `EMPTY` and `TOMBSTONE` set the high
/// bit, so a single byte comparison rejects most mismatching slots before
/// the full key comparison runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Tag(u8);

impl Tag {
    pub(crate) const EMPTY: Tag = Tag(0xFF);
    pub(crate) const TOMBSTONE: Tag = Tag(0x80);

    #[inline]
    pub(crate) fn active(hash: u64) -> Tag {
        Tag((hash >> 57) as u8)
    }

    #[inline]
    pub(crate) fn is_active(self) -> bool {
        self.0 & 0x80 == 0
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

impl<K, V> Entry<K, V> {
    #[inline]
    pub(crate) fn tag(&self) -> Tag {
        Tag::active(self.hash)
    }
}

/// Legal transitions: `Empty -> Active`, `Active -> Tombstone`,
/// `Tombstone -> Active`.
#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Empty,
    Tombstone,
    Active(Entry<K, V>),
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub(crate) fn tag(&self) -> Tag {
        match self {
            Slot::Empty => Tag::EMPTY,
            Slot::Tombstone => Tag::TOMBSTONE,
            Slot::Active(e) => e.tag(),
        }
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        matches!(self, Slot::Active(_))
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<&Entry<K, V>> {
        match self {
            Slot::Active(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> Option<&mut Entry<K, V>> {
        match self {
            Slot::Active(e) => Some(e),
            _ => None,
        }
    }

    /// Move an Active slot to Tombstone and hand back its entry.
    pub(crate) fn vacate(&mut self) -> Option<Entry<K, V>> {
        if !self.is_active() {
            return None;
        }
        match core::mem::replace(self, Slot::Tombstone) {
            Slot::Active(e) => Some(e),
            _ => unreachable!("checked is_active above"),
        }
    }

    /// Fill an Empty or Tombstone slot.
    pub(crate) fn occupy(&mut self, entry: Entry<K, V>) {
        debug_assert!(!self.is_active(), "occupying an active slot");
        *self = Slot::Active(entry);
    }
}
