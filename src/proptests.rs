use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

/// Short keys over a four-byte alphabet, so that operations collide often.
/// Includes 0x00 and the empty key.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..=4)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Add(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    Delete(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=1000)
}

/// Applies `ops` to `c` and to a `BTreeSet`, checking every result.
fn check_against_set<C: Collection>(c: &mut C, ops: &[Op]) -> std::result::Result<(), TestCaseError> {
    let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
    for op in ops {
        match op {
            Op::Add(key) => {
                c.add(key.clone());
                m.insert(key.clone());
            }
            Op::Delete(key) => {
                prop_assert_eq!(c.delete(key), m.take(key));
            }
            Op::Get(key) => {
                prop_assert_eq!(c.get(key), m.get(key).map(Vec::as_slice));
            }
        }
        prop_assert_eq!(c.len(), m.len());
    }

    let got: Vec<&[u8]> = c.iter().collect();
    let expected: Vec<&[u8]> = m.iter().map(Vec::as_slice).collect();
    prop_assert_eq!(got, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_flat_matches_set(ops in ops_strategy()) {
        let mut a = FlatSortedArray::new();
        check_against_set(&mut a, &ops)?;
        prop_assert!(a.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_red_black_matches_set(ops in ops_strategy()) {
        let mut t = RedBlackTree::new();
        check_against_set(&mut t, &ops)?;
        t.validate();
    }

    #[test]
    fn prop_btree_matches_set(ops in ops_strategy(), degree in 2usize..=6) {
        let mut t = BTree::new(degree);
        check_against_set(&mut t, &ops)?;
        t.validate();
    }

    #[test]
    fn prop_trees_hold_invariants_after_every_op(ops in prop::collection::vec(any::<Op>(), 0..=200)) {
        let mut rb = RedBlackTree::new();
        let mut bt = BTree::new(2);
        for op in &ops {
            match op {
                Op::Add(key) => {
                    rb.insert(key.clone());
                    bt.insert(key.clone());
                }
                Op::Delete(key) => {
                    prop_assert_eq!(rb.remove(key), bt.remove(key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(rb.get(key), bt.get(key));
                }
            }
            rb.validate();
            bt.validate();
        }
    }

    #[test]
    fn prop_backends_agree(ops in ops_strategy()) {
        let mut backends: Vec<AnyCollection> = [
            Backend::FlatSorted,
            Backend::RedBlack,
            Backend::BTree { degree: 2 },
            Backend::BTree { degree: 5 },
        ]
        .into_iter()
        .map(|b| b.build().unwrap())
        .collect();

        for op in &ops {
            let results: Vec<Option<Vec<u8>>> = backends
                .iter_mut()
                .map(|c| match op {
                    Op::Add(key) => {
                        c.add(key.clone());
                        None
                    }
                    Op::Delete(key) => c.delete(key),
                    Op::Get(key) => c.get(key).map(<[u8]>::to_vec),
                })
                .collect();
            prop_assert!(results.windows(2).all(|w| w[0] == w[1]), "{:?}: {:?}", op, results);
        }

        let contents: Vec<Vec<Vec<u8>>> = backends
            .iter()
            .map(|c| c.iter().map(<[u8]>::to_vec).collect())
            .collect();
        prop_assert!(contents.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn prop_lazy_matches_flat(
        adds in prop::collection::vec(key_strategy(), 0..=500),
        deletes in prop::collection::vec(key_strategy(), 0..=200)
    ) {
        let mut lazy = LazySortedArray::new();
        let mut flat = FlatSortedArray::new();
        for key in &adds {
            lazy.try_add(key.clone()).unwrap();
            flat.insert(key.clone());
        }
        lazy.try_freeze().unwrap();
        prop_assert!(lazy.as_slice().windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(lazy.as_slice(), flat.as_slice());

        for key in &deletes {
            prop_assert_eq!(lazy.try_delete(key).unwrap(), flat.remove(key));
            prop_assert_eq!(lazy.try_get(key).unwrap(), None);
        }
        prop_assert_eq!(lazy.as_slice(), flat.as_slice());
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

fn small_key_set() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"ba".to_vec(),
        b"c".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_key_set();
    let mut expected = keys.clone();
    expected.sort();

    for_each_permutation(&keys, |perm| {
        let mut rb = RedBlackTree::new();
        let mut bt = BTree::new(2);
        for k in perm {
            assert_eq!(rb.insert(k.clone()), None);
            assert_eq!(bt.insert(k), None);
            rb.validate();
            bt.validate();
        }
        let got: Vec<Vec<u8>> = rb.iter().map(<[u8]>::to_vec).collect();
        assert_eq!(got, expected);
        let got: Vec<Vec<u8>> = bt.iter().map(<[u8]>::to_vec).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_key_set();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_rb = RedBlackTree::new();
    let mut base_bt = BTree::new(2);
    for k in &keys {
        base_rb.insert(k.clone());
        base_bt.insert(k.clone());
    }

    for_each_permutation(&keys, |perm| {
        let mut rb = base_rb.clone();
        let mut bt = base_bt.clone();
        for k in perm {
            assert_eq!(rb.remove(&k).as_ref(), Some(&k));
            assert_eq!(bt.remove(&k).as_ref(), Some(&k));
            assert_eq!(rb.get(&k), None);
            assert_eq!(bt.get(&k), None);
            rb.validate();
            bt.validate();
        }
        assert!(rb.is_empty());
        assert!(bt.is_empty());
        assert_eq!(bt.height(), 1);
    });
}
