use crate::arena::Child;
use crate::bits;
use crate::Critbit;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn validate_tree<V>(t: &Critbit<V>) {
    if t.is_empty() {
        assert_eq!(t.root, Child::Nil, "empty trie must have no root");
        assert_eq!(t.node_count(), 0);
        return;
    }
    assert_eq!(
        t.node_count(),
        t.len() - 1,
        "n keys must hang off exactly n - 1 branch nodes"
    );

    // (item, position of the parent node, path so far as (offset, bit, direction))
    let mut stack: Vec<(Child, Option<u64>, Vec<(u32, u8, usize)>)> =
        vec![(t.root, None, Vec::new())];
    let mut leaf_count = 0usize;
    let mut node_count = 0usize;
    while let Some((item, parent_pos, path)) = stack.pop() {
        match item {
            Child::Nil => panic!("nil child inside trie"),
            Child::Leaf(idx) => {
                leaf_count += 1;
                let key = &t.arena.leaf(idx).key;
                for &(offset, bit, direction) in &path {
                    assert_eq!(
                        bits::direction(key, offset, bit),
                        direction,
                        "leaf {key:?} sits on the wrong side of ({offset}, {bit:#04x})"
                    );
                }
            }
            Child::Node(idx) => {
                node_count += 1;
                let node = t.arena.node(idx);
                assert!(node.bit.is_power_of_two(), "bit mask {:#04x}", node.bit);
                if let Some(parent_pos) = parent_pos {
                    assert!(
                        node.position() > parent_pos,
                        "node positions must increase away from the root"
                    );
                }
                for direction in 0..2 {
                    let mut path = path.clone();
                    path.push((node.offset, node.bit, direction));
                    stack.push((node.child[direction], Some(node.position()), path));
                }
            }
        }
    }

    assert_eq!(leaf_count, t.len(), "reachable leaf count must match len");
    assert_eq!(node_count, t.node_count(), "reachable node count must match");
}

fn entries<V: Clone>(t: &Critbit<V>) -> Vec<(Vec<u8>, V)> {
    t.iter().map(|(k, v)| (k.to_vec(), v.clone())).collect()
}

fn build<'a>(keys: impl IntoIterator<Item = &'a Vec<u8>>) -> Critbit<u64> {
    let mut t = Critbit::new();
    for (i, k) in keys.into_iter().enumerate() {
        t.upsert(k, i as u64).unwrap();
    }
    t
}

#[derive(Clone, Debug)]
enum Op<V> {
    Insert(Vec<u8>, V),
    Upsert(Vec<u8>, V),
    Update(Vec<u8>, V),
    Remove(Vec<u8>),
    Get(Vec<u8>),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // No 0x00 bytes: keys that differ only by trailing 0x00 bytes are the
    // same key to the trie.
    prop::collection::vec(1u8..=255, 0..=24)
}

/// Keys drawn from a tiny alphabet so that operations keep hitting each other.
fn dense_key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(prop::sample::select(vec![b'a', b'b', 0xff]), 0..=6)
}

fn ops_strategy(
    key: impl Strategy<Value = Vec<u8>> + Clone,
) -> impl Strategy<Value = Vec<Op<u64>>> {
    let op = prop_oneof![
        40 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        10 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Upsert(k, v)),
        10 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Update(k, v)),
        20 => key.clone().prop_map(Op::Remove),
        19 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn key_set_strategy() -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(key_strategy(), 0..=64)
}

fn run_ops(ops: Vec<Op<u64>>) -> std::result::Result<(), TestCaseError> {
    let mut t: Critbit<u64> = Critbit::new();
    let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let inserted = t.insert(&key, value).unwrap();
                prop_assert_eq!(inserted, !m.contains_key(&key));
                m.entry(key).or_insert(value);
            }
            Op::Upsert(key, value) => {
                t.upsert(&key, value).unwrap();
                m.insert(key, value);
            }
            Op::Update(key, value) => {
                let expected = m.get_mut(&key).map(|old| std::mem::replace(old, value));
                prop_assert_eq!(t.update(&key, value), expected);
            }
            Op::Remove(key) => {
                prop_assert_eq!(t.remove(&key), m.remove(&key));
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key).copied(), m.get(&key).copied());
                prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
            }
            Op::Clear => {
                t.clear();
                m.clear();
            }
        }

        prop_assert_eq!(t.len(), m.len());
        prop_assert_eq!(t.node_count(), m.len().saturating_sub(1));
    }

    validate_tree(&t);
    let expected: Vec<(Vec<u8>, u64)> = m.into_iter().collect();
    prop_assert_eq!(entries(&t), expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy(key_strategy())) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_equivalence_dense(ops in ops_strategy(dense_key_strategy())) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_insert_order_irrelevant(keys in key_set_strategy(), seed in any::<u64>()) {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let sorted: Vec<Vec<u8>> = keys.into_iter().collect();
        let mut shuffled = sorted.clone();
        shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));

        let t = build(&shuffled);
        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.keys().map(<[u8]>::to_vec).collect();
        prop_assert_eq!(&got, &sorted);
        prop_assert_eq!(t.encode_shape(), build(&sorted).encode_shape());
    }

    #[test]
    fn prop_insert_present_is_noop(keys in key_set_strategy(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!keys.is_empty());
        let keys: Vec<Vec<u8>> = keys.into_iter().collect();
        let mut t = build(&keys);
        let shape = t.encode_shape();

        let key = pick.get(&keys);
        let before = t.get(key).copied();
        prop_assert_eq!(t.insert(key, u64::MAX), Ok(false));
        prop_assert_eq!(t.get(key).copied(), before);
        prop_assert_eq!(t.encode_shape(), shape);
    }

    #[test]
    fn prop_insert_delete_inverse(keys in key_set_strategy(), extra in key_strategy()) {
        let mut t = build(&keys);
        prop_assume!(!t.contains_key(&extra));
        let shape = t.encode_shape();

        prop_assert!(t.insert(&extra, 7).unwrap());
        validate_tree(&t);
        prop_assert!(t.delete(&extra));
        prop_assert_eq!(t.encode_shape(), shape);
        validate_tree(&t);
    }

    #[test]
    fn prop_split_matches_fresh(keys in key_set_strategy(), cut in any::<prop::sample::Index>()) {
        let keys: Vec<Vec<u8>> = keys.into_iter().collect();
        let n = cut.index(keys.len() + 1);
        let t = build(&keys);
        let all = entries(&t);

        for (left, right) in [t.clone().split_at(n), t.split_at_concurrent(n)] {
            validate_tree(&left);
            validate_tree(&right);
            prop_assert_eq!(entries(&left), &all[..n]);
            prop_assert_eq!(entries(&right), &all[n..]);
            prop_assert_eq!(left.encode_shape(), build(&keys[..n]).encode_shape());
            prop_assert_eq!(right.encode_shape(), build(&keys[n..]).encode_shape());
        }
    }

    #[test]
    fn prop_slot_reuse(old in key_set_strategy(), new in key_set_strategy()) {
        let mut t = build(&old);
        for k in &old {
            prop_assert!(t.delete(k));
        }
        prop_assert!(t.is_empty());
        for (i, k) in new.iter().enumerate() {
            prop_assert!(t.insert(k, i as u64).unwrap());
        }

        validate_tree(&t);
        let fresh = build(&new);
        prop_assert_eq!(t.encode_shape(), fresh.encode_shape());
        prop_assert_eq!(entries(&t), entries(&fresh));
    }

    #[test]
    fn prop_range_from(keys in key_set_strategy(), probe in key_strategy()) {
        let t = build(&keys);
        let got: Vec<Vec<u8>> = t.range_from(&probe).map(|(k, _)| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = keys.range(probe..).cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_get_prefix(keys in key_set_strategy(), probe in key_strategy()) {
        let t = build(&keys);
        let found = t.get_prefix(&probe).map(|(k, _)| k.to_vec());
        let first = keys.iter().find(|k| k.starts_with(&probe)).cloned();
        prop_assert_eq!(found, first);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_set() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"c".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"ba".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let reference = build(&keys).encode_shape();

    for_each_permutation(&keys, |perm| {
        let mut t: Critbit<u64> = Critbit::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert!(t.insert(&k, v).unwrap());
            m.insert(k, v);
        }

        validate_tree(&t);
        assert_eq!(t.encode_shape(), reference);
        let expected: Vec<(Vec<u8>, u64)> = m.into_iter().collect();
        assert_eq!(entries(&t), expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();

    // Insert in a fixed order, then remove in all permutations.
    let base_tree = build(&keys);
    let base_map: BTreeMap<Vec<u8>, u64> =
        keys.iter().cloned().zip(0u64..).collect();

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(k.as_slice()));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
            let remaining: Vec<&Vec<u8>> = m.keys().collect();
            assert_eq!(t.encode_shape(), build(remaining).encode_shape());
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.root, Child::Nil);
    });
}

#[test]
fn exhaustive_split_small_set() {
    let keys = small_set();
    let t = build(&keys);
    let sorted: Vec<Vec<u8>> = t.keys().map(<[u8]>::to_vec).collect();

    for n in 0..=keys.len() {
        let (left, right) = t.clone().split_at(n);
        validate_tree(&left);
        validate_tree(&right);
        assert_eq!(left.keys().map(<[u8]>::to_vec).collect::<Vec<_>>(), sorted[..n]);
        assert_eq!(right.keys().map(<[u8]>::to_vec).collect::<Vec<_>>(), sorted[n..]);
    }
}
