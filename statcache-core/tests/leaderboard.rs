//! Split leaderboards end to end: query → splitArr → cache → source.

use chrono::NaiveDate;
use statcache_core::leaderboard::{param, BATTING_SPLITS, PITCHING_SPLITS};
use statcache_core::{
    DailyCache, DataOrigin, FetchError, FixedClock, FnSource, LeaderboardError, QueryError,
    QueryParams, Split, SplitsLeaderboard, SplitsQuery, Table,
};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<QueryParams>>>;

fn recording_source(
    operation: &'static str,
    seen: Seen,
) -> FnSource<impl Fn(&QueryParams) -> Result<Table, FetchError> + Send + Sync> {
    FnSource::new(operation, move |params: &QueryParams| {
        seen.lock().unwrap().push(params.clone());
        Ok(Table::from_rows(&["Name", "Split"], &[&["Player", operation]]))
    })
}

fn board(
    dir: &std::path::Path,
    seen: &Seen,
) -> SplitsLeaderboard<impl statcache_core::TableSource, impl statcache_core::TableSource> {
    let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()));
    SplitsLeaderboard::new(
        recording_source(BATTING_SPLITS, seen.clone()),
        recording_source(PITCHING_SPLITS, seen.clone()),
        DailyCache::with_clock(dir, clock),
    )
}

#[test]
fn source_receives_canonical_split_arr() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Seen::default();
    let board = board(dir.path(), &seen);

    let query = SplitsQuery::season(2023)
        .max_results(3)
        .splits(vec!["VS_LHH", "AS_RHP"]);
    let fetched = board.pitching_splits(&query, true).unwrap();

    assert_eq!(fetched.origin, DataOrigin::Remote);
    assert_eq!(fetched.table.column("Split"), Some(vec![PITCHING_SPLITS]));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].get(param::SPLIT_ARR).and_then(|v| v.as_str()),
        Some("5,96")
    );
}

#[test]
fn equivalent_selectors_share_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Seen::default();
    let board = board(dir.path(), &seen);

    let by_const = SplitsQuery::season(2023).splits([Split::VsLhh, Split::AsRhp]);
    let by_code = SplitsQuery::season(2023).splits(vec![5i64, 96]);
    let by_joined = SplitsQuery::season(2023).splits("5,96");

    board.batting_splits(&by_const, true).unwrap();
    assert_eq!(
        board.batting_splits(&by_code, true).unwrap().origin,
        DataOrigin::Cache
    );
    assert_eq!(
        board.batting_splits(&by_joined, true).unwrap().origin,
        DataOrigin::Cache
    );
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn batting_and_pitching_are_cached_apart() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Seen::default();
    let board = board(dir.path(), &seen);
    let query = SplitsQuery::season(2023).splits(Split::AsRhp);

    board.batting_splits(&query, true).unwrap();
    board.pitching_splits(&query, true).unwrap();

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(board.cache().entries().unwrap().len(), 2);
}

#[test]
fn no_splits_means_regular_data() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Seen::default();
    let board = board(dir.path(), &seen);

    let table = board
        .pitching_splits_or_none(&SplitsQuery::season(2023).max_results(3), true)
        .unwrap();
    assert!(table.is_some());

    let seen = seen.lock().unwrap();
    assert!(seen[0].get(param::SPLIT_ARR).is_some_and(|v| v.is_null()));
}

#[test]
fn codec_errors_are_not_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Seen::default();
    let board = board(dir.path(), &seen);
    let query = SplitsQuery::season(2023).splits("NOT_A_SPLIT");

    assert!(matches!(
        board.batting_splits(&query, true),
        Err(LeaderboardError::Query(QueryError::Split(_)))
    ));
    assert!(board.batting_splits_or_none(&query, true).is_err());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn failed_fetch_is_none_in_or_none_mode() {
    let dir = tempfile::tempdir().unwrap();
    let failing = || {
        FnSource::new(BATTING_SPLITS, |_: &QueryParams| {
            Err(FetchError::Remote("HTTP 503".into()))
        })
    };
    let board = SplitsLeaderboard::new(failing(), failing(), DailyCache::new(dir.path()));

    let got = board
        .batting_splits_or_none(&SplitsQuery::season(2023), true)
        .unwrap();
    assert!(got.is_none());
    assert!(board.cache().entries().unwrap().is_empty());
}
