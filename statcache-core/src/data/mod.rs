//! Table sources, query parameters, and the daily cache

pub mod cache;
pub mod key;
pub mod params;
pub mod source;
pub mod table;

pub use cache::{
    CacheError, Cached, ClearSummary, DailyCache, DataOrigin, EntryInfo, EntryMeta, Fetched,
};
pub use key::CacheKey;
pub use params::{ParamValue, QueryParams};
pub use source::{FetchError, FnSource, TableSource};
pub use table::Table;
