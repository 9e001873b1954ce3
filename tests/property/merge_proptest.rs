//! Property-based tests for the document merge semantics

use proptest::prelude::*;
use serde_json::{json, Value};
use slateboard::shared::document::merge_data;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-z]{0,8}".prop_map(|s| json!(s)),
    ]
}

fn json_object(keys: &'static [&'static str]) -> impl Strategy<Value = Value> {
    proptest::collection::vec((proptest::sample::select(keys.to_vec()), json_leaf()), 0..=4).prop_map(
        |pairs| {
            let mut map = serde_json::Map::new();
            for (key, value) in pairs {
                map.insert(key.to_string(), value);
            }
            Value::Object(map)
        },
    )
}

proptest! {
    /// Patch fields always win; untouched fields always survive
    #[test]
    fn test_merge_patch_fields_win(
        base in json_object(&["a", "b", "c", "d"]),
        patch in json_object(&["a", "b"]),
    ) {
        let merged = merge_data(base.clone(), &patch);
        for (key, value) in patch.as_object().unwrap() {
            prop_assert_eq!(&merged[key], value);
        }
        for (key, value) in base.as_object().unwrap() {
            if patch.get(key).is_none() {
                prop_assert_eq!(&merged[key], value);
            }
        }
    }

    /// Merging the same patch twice equals merging it once
    #[test]
    fn test_merge_is_idempotent(
        base in json_object(&["a", "b", "c"]),
        patch in json_object(&["a", "b"]),
    ) {
        let once = merge_data(base.clone(), &patch);
        let twice = merge_data(once.clone(), &patch);
        prop_assert_eq!(once, twice);
    }

    /// Patches on disjoint fields commute
    #[test]
    fn test_disjoint_patches_commute(
        base in json_object(&["a", "b", "c", "d"]),
        left in json_object(&["a", "b"]),
        right in json_object(&["c", "d"]),
    ) {
        let lr = merge_data(merge_data(base.clone(), &left), &right);
        let rl = merge_data(merge_data(base, &right), &left);
        prop_assert_eq!(lr, rl);
    }

    /// A sequence of patches equals its left fold
    #[test]
    fn test_sequence_is_left_fold(
        base in json_object(&["a", "b", "c"]),
        patches in proptest::collection::vec(json_object(&["a", "b", "c"]), 0..6),
    ) {
        let mut stepped = base.clone();
        for patch in &patches {
            stepped = merge_data(stepped, patch);
        }
        let folded = patches
            .iter()
            .fold(base, |acc, patch| merge_data(acc, patch));
        prop_assert_eq!(stepped, folded);
    }
}
