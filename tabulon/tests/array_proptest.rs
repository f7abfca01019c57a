//! Property tests comparing `TypedArray<i32>` mutations against a plain
//! `Vec<i32>` reference, replaying a sequence of actions against both and
//! asserting they stay in lockstep, adapted to a fixed-length,
//! `Result`-returning array instead of a growable list.

use proptest::prelude::*;
use tabulon::TypedArray;

#[derive(Debug, Clone)]
enum RawAction {
    Set(usize, i32),
    Swap(usize, usize),
    SortAscending,
    SortDescending,
}

fn raw_action() -> impl Strategy<Value = RawAction> {
    prop_oneof![
        (any::<usize>(), any::<i32>()).prop_map(|(i, v)| RawAction::Set(i, v)),
        (any::<usize>(), any::<usize>()).prop_map(|(i, j)| RawAction::Swap(i, j)),
        Just(RawAction::SortAscending),
        Just(RawAction::SortDescending),
    ]
}

fn apply(reference: &mut [i32], array: &mut TypedArray<i32>, action: &RawAction) {
    let len = reference.len();
    match *action {
        RawAction::Set(i, v) => {
            let i = i % len;
            reference[i] = v;
            array.set(i, v).unwrap();
        }
        RawAction::Swap(i, j) => {
            let (i, j) = (i % len, j % len);
            reference.swap(i, j);
            array.swap(i, j).unwrap();
        }
        RawAction::SortAscending => {
            reference.sort();
            array.sort(true, 0..len).unwrap();
        }
        RawAction::SortDescending => {
            reference.sort_by(|a, b| b.cmp(a));
            array.sort(false, 0..len).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn typed_array_tracks_vec_reference(
        initial in prop::collection::vec(any::<i32>(), 1..32),
        actions in prop::collection::vec(raw_action(), 0..50),
    ) {
        let mut reference = initial.clone();
        let mut array = TypedArray::of(initial);

        for action in &actions {
            apply(&mut reference, &mut array, action);
        }

        let observed: Vec<i32> = (0..reference.len()).map(|i| array.get(i).unwrap()).collect();
        prop_assert_eq!(observed, reference);
    }

    #[test]
    fn sorted_array_binary_search_matches_position(
        mut values in prop::collection::vec(any::<i32>(), 1..64),
        needle in any::<i32>(),
    ) {
        values.sort();
        let array = TypedArray::of(values.clone());

        let found = array.binary_search(&needle, 0..values.len()).unwrap();
        if found >= 0 {
            prop_assert_eq!(values[found as usize], needle);
        } else {
            let insertion_point = (-(found + 1)) as usize;
            prop_assert!(insertion_point <= values.len());
            if insertion_point > 0 {
                prop_assert!(values[insertion_point - 1] < needle);
            }
            if insertion_point < values.len() {
                prop_assert!(values[insertion_point] > needle);
            }
        }
    }
}
