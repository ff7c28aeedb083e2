use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;
use std::ops::Bound;

fn validate_tree<V>(t: &AdaptiveRadixTree<V>) {
    if let Err(err) = t.check_integrity() {
        panic!("{err}");
    }
}

/// Few distinct bytes, including both sides of 0x80, so keys collide, share
/// prefixes and end at each other's inner nodes.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(prop::sample::select(vec![0x00u8, 0x01, 0x7f, 0x80, 0xff]), 0..=6)
}

/// Short keys over the whole byte range, so single nodes fill up to Node256.
fn wide_key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(any::<u8>(), 1..=2)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 10)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 10)]
    Seek(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 8)]
    Range(
        #[proptest(strategy = "key_strategy()")] Vec<u8>,
        bool,
        #[proptest(strategy = "key_strategy()")] Vec<u8>,
        bool,
    ),
    #[proptest(weight = 4)]
    PopFirst,
    #[proptest(weight = 3)]
    PopLast,
}

fn bound(key: &[u8], inclusive: bool) -> Bound<&[u8]> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

fn in_bounds(key: &[u8], lo: Bound<&[u8]>, hi: Bound<&[u8]>) -> bool {
    let above = match lo {
        Bound::Included(b) => key >= b,
        Bound::Excluded(b) => key > b,
        Bound::Unbounded => true,
    };
    let below = match hi {
        Bound::Included(b) => key <= b,
        Bound::Excluded(b) => key < b,
        Bound::Unbounded => true,
    };
    above && below
}

fn pairs<'a>(entries: impl Iterator<Item = (&'a [u8], &'a u32)>) -> Vec<(Vec<u8>, u32)> {
    entries.map(|(k, v)| (k.to_vec(), *v)).collect()
}

fn model_pair(entry: Option<(&Vec<u8>, &u32)>) -> Option<(Vec<u8>, u32)> {
    entry.map(|(k, v)| (k.clone(), *v))
}

fn tree_pair(entry: Option<(&[u8], &u32)>) -> Option<(Vec<u8>, u32)> {
    entry.map(|(k, v)| (k.to_vec(), *v))
}

fn run_ops(ops: Vec<Op>, config: Config) -> std::result::Result<(), TestCaseError> {
    let mut t: AdaptiveRadixTree<u32> = AdaptiveRadixTree::with_config(config);
    let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                prop_assert_eq!(t.insert(&key, value), m.insert(key, value));
            }
            Op::Remove(key) => {
                prop_assert_eq!(t.remove(&key), m.remove(&key));
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key), m.get(&key));
                prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
            }
            Op::Seek(key) => {
                let k = key.as_slice();
                prop_assert_eq!(
                    tree_pair(t.ceiling_key_value(k)),
                    model_pair(m.range::<[u8], _>((Bound::Included(k), Bound::Unbounded)).next())
                );
                prop_assert_eq!(
                    tree_pair(t.floor_key_value(k)),
                    model_pair(m.range::<[u8], _>((Bound::Unbounded, Bound::Included(k))).next_back())
                );
                prop_assert_eq!(
                    tree_pair(t.higher_key_value(k)),
                    model_pair(m.range::<[u8], _>((Bound::Excluded(k), Bound::Unbounded)).next())
                );
                prop_assert_eq!(
                    tree_pair(t.lower_key_value(k)),
                    model_pair(m.range::<[u8], _>((Bound::Unbounded, Bound::Excluded(k))).next_back())
                );
            }
            Op::Range(lo, lo_inclusive, hi, hi_inclusive) => {
                let (lo, hi) = (bound(&lo, lo_inclusive), bound(&hi, hi_inclusive));
                match t.range::<[u8], _>((lo, hi)) {
                    Ok(range) => {
                        let expected: Vec<(Vec<u8>, u32)> = m
                            .iter()
                            .filter(|(k, _)| in_bounds(k, lo, hi))
                            .map(|(k, v)| (k.clone(), *v))
                            .collect();
                        let mut reversed = pairs(range.clone().rev());
                        reversed.reverse();
                        prop_assert_eq!(&pairs(range), &expected);
                        prop_assert_eq!(reversed, expected);
                    }
                    Err(err) => {
                        prop_assert_eq!(err, ArtError::InvertedRange);
                        let (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) = (lo, hi) else {
                            unreachable!("unbounded ranges are never inverted");
                        };
                        prop_assert!(a > b);
                    }
                }
            }
            Op::PopFirst => {
                prop_assert_eq!(t.pop_first(), m.pop_first());
            }
            Op::PopLast => {
                prop_assert_eq!(t.pop_last(), m.pop_last());
            }
        }

        prop_assert_eq!(t.len(), m.len());
    }

    validate_tree(&t);
    let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(pairs(t.iter()), expected.clone());
    let mut reversed = pairs(t.iter().rev());
    reversed.reverse();
    prop_assert_eq!(reversed, expected);
    Ok(())
}

fn no_collapse() -> Config {
    Config {
        collapse_single_child: false,
        ..Config::default()
    }
}

fn check_seeks(
    t: &AdaptiveRadixTree<u32>,
    m: &BTreeMap<Vec<u8>, u32>,
    probes: &[Vec<u8>],
) -> std::result::Result<(), TestCaseError> {
    for k in probes.iter().map(Vec::as_slice) {
        prop_assert_eq!(
            tree_pair(t.ceiling_key_value(k)),
            model_pair(m.range::<[u8], _>((Bound::Included(k), Bound::Unbounded)).next())
        );
        prop_assert_eq!(
            tree_pair(t.floor_key_value(k)),
            model_pair(m.range::<[u8], _>((Bound::Unbounded, Bound::Included(k))).next_back())
        );
        prop_assert_eq!(
            tree_pair(t.higher_key_value(k)),
            model_pair(m.range::<[u8], _>((Bound::Excluded(k), Bound::Unbounded)).next())
        );
        prop_assert_eq!(
            tree_pair(t.lower_key_value(k)),
            model_pair(m.range::<[u8], _>((Bound::Unbounded, Bound::Excluded(k))).next_back())
        );
    }
    let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(pairs(t.iter()), expected.clone());
    let mut reversed = pairs(t.iter().rev());
    reversed.reverse();
    prop_assert_eq!(reversed, expected);
    Ok(())
}

/// Fills nodes up to Node256, then drains them back through every shrink.
fn run_wide(
    inserts: &[Vec<u8>],
    removes: &[Vec<u8>],
    probes: &[Vec<u8>],
    config: Config,
) -> std::result::Result<(), TestCaseError> {
    let mut t: AdaptiveRadixTree<u32> = AdaptiveRadixTree::with_config(config);
    let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
    for (i, key) in inserts.iter().enumerate() {
        prop_assert_eq!(t.insert(key, i as u32), m.insert(key.clone(), i as u32));
    }
    validate_tree(&t);
    check_seeks(&t, &m, probes)?;
    for (i, key) in removes.iter().enumerate() {
        prop_assert_eq!(t.remove(key), m.remove(key));
        if i % 64 == 0 {
            check_seeks(&t, &m, probes)?;
        }
    }
    validate_tree(&t);
    check_seeks(&t, &m, probes)?;
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        run_ops(ops, Config::default())?;
    }

    #[test]
    fn prop_equivalence_without_collapse(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        run_ops(ops, no_collapse())?;
    }

    #[test]
    fn prop_wide_fanout(
        inserts in prop::collection::vec(wide_key_strategy(), 0..=600),
        removes in prop::collection::vec(wide_key_strategy(), 0..=600),
        probes in prop::collection::vec(wide_key_strategy(), 0..=32),
    ) {
        run_wide(&inserts, &removes, &probes, Config::default())?;
    }

    #[test]
    fn prop_wide_fanout_without_collapse(
        inserts in prop::collection::vec(wide_key_strategy(), 0..=600),
        removes in prop::collection::vec(wide_key_strategy(), 0..=600),
        probes in prop::collection::vec(wide_key_strategy(), 0..=32),
    ) {
        run_wide(&inserts, &removes, &probes, no_collapse())?;
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
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"ba".to_vec(),
        vec![0x80],
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&small_set(), |perm| {
        let mut t: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(&k, v), m.insert(k, v));
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();
    for config in [Config::default(), no_collapse()] {
        // Insert in a fixed order, then remove in all permutations.
        let mut base_tree: AdaptiveRadixTree<u64> = AdaptiveRadixTree::with_config(config);
        let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        for (i, k) in keys.iter().enumerate() {
            let v = i as u64;
            assert_eq!(base_tree.insert(k, v), base_map.insert(k.clone(), v));
        }

        for_each_permutation(&keys, |perm| {
            let mut t = base_tree.clone();
            let mut m = base_map.clone();

            for k in perm {
                assert_eq!(t.remove(&k), m.remove(&k));
                assert_eq!(t.len(), m.len());
                assert_eq!(t.first_key(), m.keys().next().map(Vec::as_slice));
                assert_eq!(t.last_key(), m.keys().next_back().map(Vec::as_slice));
                validate_tree(&t);
            }
            assert!(t.is_empty());
            assert_eq!(t.node_stats(), NodeStats::default());
        });
    }
}
