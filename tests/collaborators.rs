use stable_collections::{prepend, SortedArray, SortedMap, SortedSet, StableMap};

#[test]
fn sorted_array_lookups() {
    let mut a: SortedArray<&str> = ["pear", "apple", "fig"].into_iter().collect();
    assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec!["apple", "fig", "pear"]);
    assert_eq!(a.insertion_point(&"banana"), 1);
    assert_eq!(a.insert("banana"), 1);
    assert_eq!(a.index_of(&"fig"), Some(2));
    assert_eq!(a.index_of(&"kiwi"), None);
    assert_eq!(a.len(), 4);
}

#[test]
fn sorted_map_from_stable_map_contents() {
    let stable: StableMap<u32, &str> =
        StableMap::from_unique_pairs([(30, "c"), (10, "a"), (20, "b")]);
    let sorted: SortedMap<u32, &str> = stable.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(sorted.keys().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
    assert_eq!(stable.keys().copied().collect::<Vec<_>>(), vec![30, 10, 20]);
    assert_eq!(sorted.get(&20), Some(&"b"));
}

#[test]
fn sorted_set_unique_ascending() {
    let s: SortedSet<char> = "mississippi".chars().collect();
    assert_eq!(s.iter().collect::<String>(), "imps");
}

#[test]
fn prepend_head_before_map_keys() {
    let m: StableMap<&str, ()> = StableMap::from_unique_pairs([("b", ()), ("c", ())]);
    let all: Vec<&str> = prepend("a", m.keys().copied()).collect();
    assert_eq!(all, vec!["a", "b", "c"]);
}
