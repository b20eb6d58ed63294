//! Table source trait and fetch errors.
//!
//! A `TableSource` is whatever actually talks to the remote leaderboard. The
//! cache sits above this trait; sources don't know about the cache.

use super::params::QueryParams;
use super::table::Table;
use thiserror::Error;

/// Why a remote fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("remote source returned an error: {0}")]
    Remote(String),

    #[error("could not parse remote table: {0}")]
    Parse(String),

    #[error("fetch failed: {0}")]
    Other(String),
}

/// A parameterized, potentially expensive fetch of one kind of table.
pub trait TableSource: Send + Sync {
    /// Operation name, used as the cache key prefix (e.g. `pitching_splits`).
    fn operation(&self) -> &str;

    /// Fetch the table for `params`.
    fn fetch(&self, params: &QueryParams) -> Result<Table, FetchError>;
}

/// Adapts a closure into a [`TableSource`].
pub struct FnSource<F> {
    operation: String,
    fetch: F,
}

impl<F> FnSource<F>
where
    F: Fn(&QueryParams) -> Result<Table, FetchError> + Send + Sync,
{
    pub fn new(operation: impl Into<String>, fetch: F) -> Self {
        Self {
            operation: operation.into(),
            fetch,
        }
    }
}

impl<F> TableSource for FnSource<F>
where
    F: Fn(&QueryParams) -> Result<Table, FetchError> + Send + Sync,
{
    fn operation(&self) -> &str {
        &self.operation
    }

    fn fetch(&self, params: &QueryParams) -> Result<Table, FetchError> {
        (self.fetch)(params)
    }
}

impl<S: TableSource + ?Sized> TableSource for &S {
    fn operation(&self) -> &str {
        (**self).operation()
    }

    fn fetch(&self, params: &QueryParams) -> Result<Table, FetchError> {
        (**self).fetch(params)
    }
}
