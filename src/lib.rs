//! stable-collections: container types built around a position-stable,
//! copy-on-write hash dictionary.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a hash map whose entries never move. An entry's position is
//!   fixed from insertion until that entry is removed, across inserts and
//!   removals of other keys and across capacity growth.
//! - Layers:
//!   - Slot<K, V>: tri-state cell (Empty / Tombstone / Active) with a
//!     one-byte tag carrying 7 bits of hash for Active entries.
//!   - ProbeIndex: open-addressing table (linear probing) from hash to
//!     slot position; lookup acceleration only.
//!   - StorageBlock<K, V>: slot array, live `count`, high-water `end`,
//!     and the probe index. Shared behind an `Arc`.
//!   - StableMap<K, V, S>: public value type with copy-on-write
//!     mutation. StableSet<T, S> projects it onto `V = ()`.
//!
//! Constraints
//! - `0 <= count <= end <= capacity`; positions `>= end` are Empty.
//! - Removal marks the slot Tombstone and leaves its index entries in
//!   place. Lookup reads the slot to decide membership, so a stale entry
//!   only costs a probe step.
//! - Insertion reuses the first tombstone met on the key's probe chain,
//!   otherwise appends at `end`. Removing a key and reinserting it before
//!   any other insertion restores its old position.
//! - Growth doubles capacity and keeps every Active slot at the same
//!   position. Tombstones do not survive a reallocation.
//!
//! Copy-on-write
//! - Cloning a map copies an `Arc`. The first mutation through a value
//!   that does not own its block outright copies the block
//!   (`Arc::make_mut`), so writes are never observable through another
//!   clone. Clones may be read from several threads at once.
//! - Reads, and mutations that turn out to be no-ops (removing an
//!   absent key), never copy.
//!
//! Hasher and rehashing invariants
//! - Each Active entry stores its full `u64` hash. Reallocation and index
//!   rebuilds use the stored hash; `K: Hash` runs once per insert or
//!   lookup call.
//!
//! Failure model
//! - Misuse of positions (`remove_at` on a non-element, `index_before`
//!   the first element, `index_after` the end) and duplicate keys in
//!   `from_unique_pairs` panic. Absence-tolerant callers use `get`,
//!   `index_of`, `remove` and `try_from_unique_pairs`.
//!
//! Notes and non-goals
//! - No ordering by key; iteration is ascending position order.
//! - Equality and hashing are position-order sensitive.
//! - No compaction: it would move positions.
//!
//! The crate also carries the small collaborators the dictionary is used
//! with: binary-search sorted containers (`sorted`) and an iterator
//! adapter that prepends a head element (`prepend`).

mod probe_index;
mod slot;
mod stable_map_proptest;
mod storage;

pub mod prepend;
pub mod sorted;
pub mod stable_map;
pub mod stable_set;

// Public surface
pub use prepend::{prepend, Prepend};
pub use sorted::{SortedArray, SortedMap, SortedSet};
pub use stable_map::{InsertError, StableMap};
pub use stable_set::StableSet;
