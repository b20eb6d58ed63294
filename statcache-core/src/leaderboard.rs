//! Split leaderboards: batting and pitching stats filtered by splits, fetched
//! through the daily cache.

use crate::data::cache::{CacheError, DailyCache, Fetched};
use crate::data::params::QueryParams;
use crate::data::source::TableSource;
use crate::data::table::Table;
use crate::splits::{SplitError, SplitSelector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operation name for batting split leaderboards.
pub const BATTING_SPLITS: &str = "batting_splits";
/// Operation name for pitching split leaderboards.
pub const PITCHING_SPLITS: &str = "pitching_splits";

/// Parameter names sent to the source.
pub mod param {
    pub const START_SEASON: &str = "start_season";
    pub const END_SEASON: &str = "end_season";
    pub const MAX_RESULTS: &str = "max_results";
    pub const SPLIT_ARR: &str = "splitArr";
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("end season {end} is before start season {start}")]
    SeasonRange { start: i32, end: i32 },

    #[error(transparent)]
    Split(#[from] SplitError),
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A split leaderboard request.
///
/// `end_season: None` means "same as start" and is left out of the cache key,
/// as is `splits: None` (plain, unsplit stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitsQuery {
    pub start_season: i32,
    pub end_season: Option<i32>,
    pub max_results: Option<u32>,
    pub splits: Option<SplitSelector>,
}

impl SplitsQuery {
    pub fn season(start_season: i32) -> Self {
        Self {
            start_season,
            end_season: None,
            max_results: None,
            splits: None,
        }
    }

    pub fn through(mut self, end_season: i32) -> Self {
        self.end_season = Some(end_season);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn splits(mut self, splits: impl Into<SplitSelector>) -> Self {
        self.splits = Some(splits.into());
        self
    }

    /// Validate and encode into source parameters.
    pub fn to_params(&self) -> Result<QueryParams, QueryError> {
        if let Some(end) = self.end_season {
            if end < self.start_season {
                return Err(QueryError::SeasonRange {
                    start: self.start_season,
                    end,
                });
            }
        }

        let split_arr = self
            .splits
            .as_ref()
            .map(SplitSelector::to_param)
            .transpose()?;

        Ok(QueryParams::new()
            .with(param::START_SEASON, self.start_season)
            .with(param::END_SEASON, self.end_season)
            .with(param::MAX_RESULTS, self.max_results)
            .with(param::SPLIT_ARR, split_arr))
    }
}

/// Batting and pitching split leaderboards behind one cache.
pub struct SplitsLeaderboard<B, P> {
    batting: B,
    pitching: P,
    cache: DailyCache,
}

impl<B: TableSource, P: TableSource> SplitsLeaderboard<B, P> {
    pub fn new(batting: B, pitching: P, cache: DailyCache) -> Self {
        Self {
            batting,
            pitching,
            cache,
        }
    }

    pub fn cache(&self) -> &DailyCache {
        &self.cache
    }

    pub fn batting_splits(
        &self,
        query: &SplitsQuery,
        use_cache: bool,
    ) -> Result<Fetched, LeaderboardError> {
        let params = query.to_params()?;
        Ok(self.cache.fetch(&self.batting, &params, use_cache)?)
    }

    pub fn pitching_splits(
        &self,
        query: &SplitsQuery,
        use_cache: bool,
    ) -> Result<Fetched, LeaderboardError> {
        let params = query.to_params()?;
        Ok(self.cache.fetch(&self.pitching, &params, use_cache)?)
    }

    /// Like [`Self::batting_splits`], but a failed fetch is logged and
    /// returned as `Ok(None)`. Invalid queries still error.
    pub fn batting_splits_or_none(
        &self,
        query: &SplitsQuery,
        use_cache: bool,
    ) -> Result<Option<Table>, QueryError> {
        let params = query.to_params()?;
        Ok(self.cache.get(&self.batting, &params, use_cache))
    }

    pub fn pitching_splits_or_none(
        &self,
        query: &SplitsQuery,
        use_cache: bool,
    ) -> Result<Option<Table>, QueryError> {
        let params = query.to_params()?;
        Ok(self.cache.get(&self.pitching, &params, use_cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::params::ParamValue;
    use crate::splits::Split;

    #[test]
    fn query_maps_to_params() {
        let params = SplitsQuery::season(2023)
            .max_results(3)
            .splits([Split::VsLhh, Split::AsRhp])
            .to_params()
            .unwrap();

        assert_eq!(
            params.get(param::START_SEASON),
            Some(&ParamValue::Int(2023))
        );
        assert_eq!(params.get(param::MAX_RESULTS), Some(&ParamValue::Int(3)));
        assert_eq!(params.get(param::END_SEASON), Some(&ParamValue::Null));
        assert_eq!(
            params.get(param::SPLIT_ARR),
            Some(&ParamValue::Text("5,96".into()))
        );
    }

    #[test]
    fn unsplit_query_has_null_split_arr() {
        let params = SplitsQuery::season(2023).to_params().unwrap();
        assert_eq!(params.get(param::SPLIT_ARR), Some(&ParamValue::Null));
        assert_eq!(params.non_null().count(), 1);
    }

    #[test]
    fn season_range_is_checked() {
        let err = SplitsQuery::season(2024).through(2022).to_params().unwrap_err();
        assert!(matches!(err, QueryError::SeasonRange { start: 2024, end: 2022 }));
    }

    #[test]
    fn bad_split_name_surfaces() {
        let err = SplitsQuery::season(2024).splits("VS_NOBODY").to_params().unwrap_err();
        assert!(matches!(err, QueryError::Split(SplitError::UnknownSplitName(_))));
    }
}
