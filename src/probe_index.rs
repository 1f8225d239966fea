//! ProbeIndex: open-addressing table from a key hash to candidate slot
//! positions, resolved with linear probing.
//!
//! The index only accelerates lookup. Occupancy is owned by the slot
//! array, so entries are never cleared on removal: a stale entry still
//! routes to its position, and the caller decides membership by reading
//! the slot it lands on.

const UNSET: usize = usize::MAX;

#[derive(Clone, Debug)]
pub(crate) struct ProbeIndex {
    table: Box<[usize]>,
    used: usize,
}

impl ProbeIndex {
    /// `floor(capacity * 1.25)`, and at least `capacity + 1` so that a
    /// table holding `capacity` entries still has an unset entry.
    pub(crate) fn table_size_for(capacity: usize) -> usize {
        if capacity == 0 {
            return 0;
        }
        (capacity + capacity / 4).max(capacity + 1)
    }

    pub(crate) fn for_capacity(capacity: usize) -> Self {
        Self {
            table: vec![UNSET; Self::table_size_for(capacity)].into_boxed_slice(),
            used: 0,
        }
    }

    pub(crate) fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Number of written entries, stale ones included.
    pub(crate) fn used(&self) -> usize {
        self.used
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        (hash % self.table.len() as u64) as usize
    }

    /// Record `position` in the first unset entry at or after the home
    /// bucket of `hash`.
    pub(crate) fn assign(&mut self, position: usize, hash: u64) {
        debug_assert!(position != UNSET);
        assert!(
            self.used < self.table.len(),
            "probe index saturated: {} of {} entries used",
            self.used,
            self.table.len()
        );
        let len = self.table.len();
        let mut i = self.home(hash);
        while self.table[i] != UNSET {
            i += 1;
            if i == len {
                i = 0;
            }
        }
        self.table[i] = position;
        self.used += 1;
    }

    /// Positions recorded along the probe chain of `hash`, in probe
    /// order, ending at the first unset entry.
    pub(crate) fn chain(&self, hash: u64) -> Chain<'_> {
        let start = if self.table.is_empty() {
            0
        } else {
            self.home(hash)
        };
        Chain {
            table: &self.table,
            at: start,
            remaining: self.table.len(),
        }
    }

    /// Forget every entry; the table keeps its size.
    pub(crate) fn clear(&mut self) {
        self.table.fill(UNSET);
        self.used = 0;
    }
}

pub(crate) struct Chain<'a> {
    table: &'a [usize],
    at: usize,
    remaining: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let e = self.table[self.at];
        if e == UNSET {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        self.at += 1;
        if self.at == self.table.len() {
            self.at = 0;
        }
        Some(e)
    }
}
