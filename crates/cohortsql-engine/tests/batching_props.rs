//! Batching Properties
//!
//! Round-trip, sizing and determinism guarantees of the batch splitter.

use cohortsql_engine::split_into_batches;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(vec![], Some(10), vec![])]
#[case(vec![0, 1, 2, 3, 4, 5, 6], Some(3), vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]])]
#[case(vec![0, 1, 2, 3], Some(6), vec![vec![0, 1, 2, 3]])]
#[case(vec![0, 1, 2, 3], None, vec![vec![0, 1, 2, 3]])]
fn test_reference_partitions(
    #[case] items: Vec<i32>,
    #[case] size: Option<usize>,
    #[case] expected: Vec<Vec<i32>>,
) {
    let batches: Vec<Vec<i32>> = split_into_batches(items, size).unwrap().collect();
    assert_eq!(batches, expected);
}

proptest! {
    #[test]
    fn prop_concatenation_round_trips(items in prop::collection::vec(any::<u16>(), 0..200), size in 1usize..20) {
        let batches: Vec<Vec<u16>> = split_into_batches(items.clone(), Some(size)).unwrap().collect();
        let rejoined: Vec<u16> = batches.iter().flatten().copied().collect();
        prop_assert_eq!(rejoined, items);
    }

    #[test]
    fn prop_all_batches_full_except_last(items in prop::collection::vec(any::<u16>(), 1..200), size in 1usize..20) {
        let batches: Vec<Vec<u16>> = split_into_batches(items, Some(size)).unwrap().collect();
        let (last, full) = batches.split_last().unwrap();
        for batch in full {
            prop_assert_eq!(batch.len(), size);
        }
        prop_assert!(!last.is_empty() && last.len() <= size);
    }

    #[test]
    fn prop_partition_is_deterministic(items in prop::collection::vec(any::<u16>(), 0..100), size in 1usize..10) {
        let first: Vec<Vec<u16>> = split_into_batches(items.clone(), Some(size)).unwrap().collect();
        let second: Vec<Vec<u16>> = split_into_batches(items, Some(size)).unwrap().collect();
        prop_assert_eq!(first, second);
    }
}
