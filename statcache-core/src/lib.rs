//! statcache core — split selector codec and a date-keyed CSV cache for
//! remote stats leaderboards.
//!
//! - `splits`: named split codes and the `splitArr` codec
//! - `data`: query parameters, cache keys, tables, the `TableSource` trait,
//!   and `DailyCache`, which runs each distinct fetch at most once per day
//! - `leaderboard`: batting/pitching split leaderboards on top of the cache
//! - `config`: cache directory and enable flag from TOML and the environment
//! - `clock`: injectable wall clock for day boundaries

pub mod clock;
pub mod config;
pub mod data;
pub mod leaderboard;
pub mod splits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CacheConfig, ConfigError};
pub use data::{
    CacheError, CacheKey, ClearSummary, DailyCache, DataOrigin, FetchError, FnSource, Fetched,
    ParamValue, QueryParams, Table, TableSource,
};
pub use leaderboard::{LeaderboardError, QueryError, SplitsLeaderboard, SplitsQuery};
pub use splits::{format_split_array, Split, SplitError, SplitItem, SplitSelector};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<DailyCache>();
        require_sync::<DailyCache>();
        require_send::<Table>();
        require_sync::<Table>();
        require_send::<QueryParams>();
        require_sync::<QueryParams>();
        require_send::<SplitSelector>();
        require_sync::<SplitSelector>();
        require_send::<CacheError>();
        require_sync::<CacheError>();
    }
}
