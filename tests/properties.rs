//! Property tests: random operation histories checked against a `Vec` model.

use blocklist::BlockedList;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert { pos: usize, value: i64 },
    Remove { pos: usize },
    Get { pos: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<i64>()).prop_map(|(pos, value)| Op::Insert { pos, value }),
        2 => any::<usize>().prop_map(|pos| Op::Remove { pos }),
        1 => any::<usize>().prop_map(|pos| Op::Get { pos }),
    ]
}

fn apply(list: &mut BlockedList, model: &mut Vec<i64>, op: &Op) {
    match *op {
        Op::Insert { pos, value } => {
            let pos = pos % (model.len() + 1);
            list.insert(pos, value).unwrap();
            model.insert(pos, value);
            assert_eq!(list.get(pos), Ok(value));
        }
        Op::Remove { pos } => {
            if model.is_empty() {
                assert!(list.remove_at(pos).is_err());
            } else {
                let pos = pos % model.len();
                let before = list.get(pos).unwrap();
                assert_eq!(list.remove_at(pos), Ok(before));
                assert_eq!(before, model.remove(pos));
            }
        }
        Op::Get { pos } => {
            if model.is_empty() {
                assert!(list.get(pos).is_err());
            } else {
                let pos = pos % model.len();
                assert_eq!(list.get(pos), Ok(model[pos]));
            }
        }
    }
}

proptest! {
    #[test]
    fn matches_vec_model(capacity in 2usize..10, ops in prop::collection::vec(arb_op(), 0..400)) {
        let mut list = BlockedList::with_block_capacity(capacity).unwrap();
        let mut model = Vec::new();

        for op in &ops {
            let len_before = model.len();
            apply(&mut list, &mut model, op);
            list.validate_blocks();

            prop_assert_eq!(list.len(), model.len());
            prop_assert!(model.len().abs_diff(len_before) <= 1);
            prop_assert!(list.block_lens().all(|n| n > 0 && n <= capacity));
            prop_assert_eq!(list.block_lens().sum::<usize>(), list.len());
        }
        prop_assert_eq!(list.iter().collect::<Vec<_>>(), model);
    }

    #[test]
    fn collect_then_drain(values in prop::collection::vec(any::<i64>(), 0..300), seed in any::<u64>()) {
        let mut list: BlockedList = values.iter().copied().collect();
        let mut model = values;
        prop_assert_eq!(list.iter().collect::<Vec<_>>(), model.clone());

        let mut state = seed;
        while !model.is_empty() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pos = (state >> 33) as usize % model.len();
            prop_assert_eq!(list.remove_at(pos), Ok(model.remove(pos)));
            list.validate_blocks();
        }
        prop_assert!(list.is_empty());
        prop_assert_eq!(list.block_count(), 0);
    }
}
