//! Property tests for codec and key invariants.
//!
//! 1. Codec idempotence — formatting a formatted string returns it unchanged
//! 2. Codec form equivalence — constants, codes, and names agree
//! 3. Key determinism — insertion order never changes the key
//! 4. Key sensitivity — changing one value changes the key

use proptest::prelude::*;
use statcache_core::data::key::{parse_entry_name, CacheKey};
use statcache_core::{format_split_array, QueryParams, Split, SplitItem, SplitSelector};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_split() -> impl Strategy<Value = Split> {
    prop::sample::select(Split::ALL.to_vec())
}

fn arb_item() -> impl Strategy<Value = SplitItem> {
    prop_oneof![
        arb_split().prop_map(SplitItem::Split),
        (0i64..200).prop_map(SplitItem::Code),
        arb_split().prop_map(|s| SplitItem::Name(s.name().to_lowercase())),
    ]
}

fn arb_params() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z_]{1,12}", any::<i64>(), 1..8)
        .prop_map(|m| m.into_iter().collect())
}

// ── 1 & 2. Codec ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn formatting_is_idempotent(items in prop::collection::vec(arb_item(), 1..6)) {
        let once = format_split_array(SplitSelector::Many(items)).unwrap();
        prop_assume!(once.contains(','));
        let twice = format_split_array(once.as_str()).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn constant_code_and_name_agree(splits in prop::collection::vec(arb_split(), 1..6)) {
        let by_const = format_split_array(splits.clone()).unwrap();
        let codes: Vec<i64> = splits.iter().map(|s| s.code()).collect();
        let names: Vec<&str> = splits.iter().map(|s| s.name()).collect();
        let by_code = format_split_array(codes).unwrap();
        let by_name = format_split_array(names).unwrap();
        prop_assert_eq!(&by_const, &by_code);
        prop_assert_eq!(&by_const, &by_name);
        prop_assert_eq!(by_const.split(',').count(), splits.len());
    }

    // ── 3 & 4. Keys ──────────────────────────────────────────────────

    #[test]
    fn key_ignores_insertion_order(pairs in arb_params()) {
        let forward: QueryParams = pairs.iter().cloned().collect();
        let backward: QueryParams = pairs.iter().rev().cloned().collect();
        prop_assert_eq!(
            CacheKey::compute("batting_splits", &forward),
            CacheKey::compute("batting_splits", &backward)
        );
    }

    #[test]
    fn key_tracks_every_value(pairs in arb_params(), idx in any::<prop::sample::Index>()) {
        let params: QueryParams = pairs.iter().cloned().collect();
        let (name, value) = &pairs[idx.index(pairs.len())];
        let changed = params.clone().with(name.clone(), value.wrapping_add(1));
        prop_assert_ne!(
            CacheKey::compute("batting_splits", &params),
            CacheKey::compute("batting_splits", &changed)
        );
    }

    #[test]
    fn entry_names_round_trip(op in "[a-z][a-z_]{0,20}", pairs in arb_params()) {
        let params: QueryParams = pairs.into_iter().collect();
        let key = CacheKey::compute(&op, &params);
        let date = chrono::NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();
        let parsed = parse_entry_name(&key.data_file_name(date)).unwrap();
        prop_assert_eq!(parsed.key, key);
        prop_assert_eq!(parsed.date, date);
    }
}
