// StableMap property tests through the public API.
//
// Property 1: copy-on-write isolation.
//  - Model: a frozen clone taken at a random point of the run.
//  - Invariant: nothing done to the live map afterwards changes the
//    frozen clone's len, lookups or iteration.
//
// Property 2: remove-then-reinsert restores the position.
//  - Keys are distinct u64 values; after building the map, each key in
//    turn is removed and immediately reinserted.
//  - Invariant: the key returns to its previous position and no other
//    key moves.
use proptest::prelude::*;
use stable_collections::StableMap;

fn snapshot(m: &StableMap<u16, i64>) -> Vec<(u16, i64)> {
    m.iter().map(|(k, v)| (*k, *v)).collect()
}

proptest! {
    #[test]
    fn prop_frozen_clone_never_changes(
        ops in proptest::collection::vec((0u8..=3u8, 0u16..32, any::<i64>()), 1..120),
        freeze_at in 0usize..120,
    ) {
        let mut live: StableMap<u16, i64> = StableMap::new();
        let mut frozen: Option<(StableMap<u16, i64>, Vec<(u16, i64)>)> = None;

        for (step, (op, k, v)) in ops.into_iter().enumerate() {
            if step == freeze_at {
                let f = live.clone();
                let s = snapshot(&f);
                frozen = Some((f, s));
            }
            match op {
                0 => { live.insert(k, v); }
                1 => { live.remove(&k); }
                2 => {
                    if let Some(x) = live.get_mut(&k) {
                        *x = x.wrapping_add(v);
                    }
                }
                3 => live.reserve_capacity(live.capacity() + (k as usize)),
                _ => unreachable!(),
            }
            if let Some((f, s)) = &frozen {
                prop_assert_eq!(&snapshot(f), s);
                prop_assert_eq!(f.len(), s.len());
                for (key, value) in s {
                    prop_assert_eq!(f.get(key), Some(value));
                }
            }
        }
    }

    #[test]
    fn prop_remove_reinsert_restores_position(
        keys in proptest::collection::hash_set(any::<u64>(), 1..64),
    ) {
        let mut m: StableMap<u64, usize> = StableMap::new();
        for (i, &k) in keys.iter().enumerate() {
            m.insert(k, i);
        }
        let positions: Vec<(u64, usize)> =
            m.keys().map(|&k| (k, m.index_of(&k).unwrap())).collect();
        for &(k, p) in &positions {
            let v = m.remove(&k).unwrap();
            m.insert(k, v);
            prop_assert_eq!(m.index_of(&k), Some(p));
        }
        for &(k, p) in &positions {
            prop_assert_eq!(m.index_of(&k), Some(p));
        }
        prop_assert_eq!(m.end_index(), keys.len());
    }
}
