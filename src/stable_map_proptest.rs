#![cfg(test)]

// Property tests for StableMap kept inside the crate so they can check
// storage-level invariants (end, capacity, tombstone handling) directly.

use crate::stable_map::StableMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Assign(usize, i32),
    Remove(usize),
    RemoveAtKeyPosition(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(usize),
    CloneAndWrite(usize, i32),
    RemoveAllKeep,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Assign(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveAtKeyPosition),
            1 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..40).prop_map(OpI::Reserve),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::CloneAndWrite(i, v)),
            1 => Just(OpI::RemoveAllKeep),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Model: key -> (value, position). Positions of live keys must never
/// change; iteration must list live keys in ascending position.
fn run_scenario<S>(pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Default + Clone,
{
    let mut sut: StableMap<Key, i32, S> = StableMap::with_hasher(S::default());
    let mut model: HashMap<Key, (i32, usize)> = HashMap::new();

    for op in ops {
        match op {
            OpI::Assign(i, v) => {
                let k = key_from(pool, i);
                let end_before = sut.end_index();
                let (inserted, p) = sut.assign_value(k.clone(), v);
                match model.get_mut(&k) {
                    Some(entry) => {
                        prop_assert!(!inserted, "existing key must be overwritten");
                        prop_assert_eq!(p, entry.1, "overwrite keeps position");
                        entry.0 = v;
                    }
                    None => {
                        prop_assert!(inserted);
                        prop_assert!(p <= end_before, "new position is a reused slot or end");
                        prop_assert!(
                            model.values().all(|&(_, q)| q != p),
                            "new position must not alias a live entry"
                        );
                        model.insert(k, (v, p));
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let end_before = sut.end_index();
                let got = sut.remove(&k);
                prop_assert_eq!(got, model.remove(&k).map(|(v, _)| v));
                prop_assert_eq!(sut.end_index(), end_before, "removal never lowers end");
            }
            OpI::RemoveAtKeyPosition(i) => {
                let k = key_from(pool, i);
                if let Some((v, p)) = model.remove(&k) {
                    let (kk, vv) = sut.remove_at(p);
                    prop_assert!(kk == k);
                    prop_assert_eq!(vv, v);
                    prop_assert!(sut.get_at(p).is_none());
                }
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.index_of(&k), model.get(&k).map(|&(_, p)| p));
                prop_assert_eq!(sut.get(&k), model.get(&k).map(|(v, _)| v));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        mv.0 = mv.0.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "get_mut mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Reserve(n) => {
                let cap_before = sut.capacity();
                sut.reserve_capacity(n);
                prop_assert!(sut.capacity() >= n);
                prop_assert!(sut.capacity() >= cap_before);
            }
            OpI::CloneAndWrite(i, v) => {
                let snapshot = sut.clone();
                let before: Vec<(Key, i32)> =
                    snapshot.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let mut other = sut.clone();
                other.insert(key_from(pool, i), v);
                other.remove(&key_from(pool, (i + 1) % pool.len()));
                let after: Vec<(Key, i32)> =
                    snapshot.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(before, after, "writes to a clone leak into the original");
                prop_assert!(snapshot == sut);
            }
            OpI::RemoveAllKeep => {
                let cap = sut.capacity();
                sut.remove_all(true);
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
                prop_assert_eq!(sut.end_index(), 0);
            }
            OpI::Iterate => {
                let by_position: BTreeMap<usize, (Key, i32)> = model
                    .iter()
                    .map(|(k, &(v, p))| (p, (k.clone(), v)))
                    .collect();
                let expected: Vec<(Key, i32)> = by_position.into_values().collect();
                let seen: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &expected);
                let mut reversed: Vec<(Key, i32)> =
                    sut.iter().rev().map(|(k, v)| (k.clone(), *v)).collect();
                reversed.reverse();
                prop_assert_eq!(reversed, expected);
            }
        }

        // Post-conditions after each op
        // 1) Every live key is still at its recorded position.
        for (k, &(v, p)) in &model {
            prop_assert_eq!(sut.index_of(k), Some(p));
            prop_assert_eq!(sut.get_at(p), Some((k, &v)));
        }
        // 2) count == Active positions in [0, end); count <= end <= capacity.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.positions().count(), sut.len());
        prop_assert!(sut.len() <= sut.end_index());
        prop_assert!(sut.end_index() <= sut.capacity());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario::<hashbrown::hash_map::DefaultHashBuilder>(&pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstHasher;
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (every key shares one probe chain). This stresses
// tombstone skipping and stale index entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario::<BuildHasherDefault<ConstHasher>>(&pool, ops)?;
    }
}

// Property: reserving capacity never moves a live entry.
proptest! {
    #[test]
    fn prop_reserve_preserves_positions(
        keys in proptest::collection::hash_set(0u32..500, 1..60),
        drop_every in 2usize..5,
        extra in 1usize..200,
    ) {
        let mut m: StableMap<u32, u32> = StableMap::new();
        for &k in &keys {
            m.insert(k, k * 2);
        }
        let doomed: Vec<u32> = m.keys().copied().step_by(drop_every).collect();
        for k in &doomed {
            m.remove(k);
        }
        let before: Vec<(u32, usize)> = m.keys().map(|&k| (k, m.index_of(&k).unwrap())).collect();
        let target = m.capacity() + extra;
        m.reserve_capacity(target);
        prop_assert!(m.capacity() >= target);
        for (k, p) in before {
            prop_assert_eq!(m.index_of(&k), Some(p));
            prop_assert_eq!(m.get(&k), Some(&(k * 2)));
        }
    }
}
