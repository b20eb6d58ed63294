//! Date-keyed CSV cache around a [`TableSource`].
//!
//! Layout: `{cache_dir}/{operation}_{hash8}_{YYYY-MM-DD}.csv`
//!
//! Features:
//! - At most one real fetch per parameter set per calendar day
//! - Atomic writes (write to .tmp, rename into place)
//! - Metadata sidecar per entry (key, fetch date, data hash, parameter snapshot)
//! - Integrity check on load; unreadable entries count as misses
//! - Fetch failures are never cached
//! - Best-effort cleanup by age or staleness

use super::key::{parse_entry_name, CacheKey, EntryFile, ParsedEntryName, TMP_EXT};
use super::params::QueryParams;
use super::source::{FetchError, TableSource};
use super::table::Table;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors surfaced by the cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("fetch failed for '{operation}': {error}")]
    Fetch {
        operation: String,
        #[source]
        error: FetchError,
    },

    #[error("cache I/O error: {0}")]
    Io(String),
}

/// Where a returned table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    Cache,
    Remote,
}

/// A table plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub table: Table,
    pub origin: DataOrigin,
}

/// Metadata sidecar written next to each entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub key: String,
    pub operation: String,
    pub fetched_on: NaiveDate,
    pub cached_at: NaiveDateTime,
    pub row_count: usize,
    pub data_hash: String,
    pub params: QueryParams,
}

/// One entry as seen by [`DailyCache::entries`].
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub key: CacheKey,
    pub date: NaiveDate,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub stale: bool,
    pub meta: Option<EntryMeta>,
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub removed: usize,
    pub failed: usize,
    pub bytes_freed: u64,
}

/// The daily cache.
#[derive(Clone)]
pub struct DailyCache {
    cache_dir: PathBuf,
    enabled: bool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DailyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyCache")
            .field("cache_dir", &self.cache_dir)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl DailyCache {
    /// Cache rooted at `cache_dir`. The directory is created on first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(cache_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(cache_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            enabled: true,
            clock,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(&config.dir);
        cache.enabled = config.enabled;
        cache
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// When disabled, every call fetches and nothing is written.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn key(&self, operation: &str, params: &QueryParams) -> CacheKey {
        CacheKey::compute(operation, params)
    }

    /// Path of the data file for `key` on `date`.
    pub fn entry_path(&self, key: &CacheKey, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(key.data_file_name(date))
    }

    fn meta_path(&self, key: &CacheKey, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(key.meta_file_name(date))
    }

    /// Fetch through the cache, reporting fetch failures as errors.
    ///
    /// With `use_cache`, a valid entry from today is returned without calling
    /// the source; otherwise the source is called and a successful result is
    /// stored under today's date. Cache read and write failures never fail
    /// the call.
    pub fn fetch<S: TableSource + ?Sized>(
        &self,
        source: &S,
        params: &QueryParams,
        use_cache: bool,
    ) -> Result<Fetched, CacheError> {
        let use_cache = use_cache && self.enabled;
        let operation = source.operation();
        let key = self.key(operation, params);
        // Pin the day up front: a fetch that straddles midnight is filed
        // under the day it started.
        let today = self.clock.today();

        if use_cache {
            if let Some(table) = self.load_valid(&key, today) {
                tracing::debug!(key = %key, "cache hit");
                return Ok(Fetched {
                    table,
                    origin: DataOrigin::Cache,
                });
            }
            tracing::debug!(key = %key, "cache miss");
        }

        let table = source.fetch(params).map_err(|error| CacheError::Fetch {
            operation: operation.to_string(),
            error,
        })?;

        if use_cache {
            if let Err(e) = self.store(&key, today, params, &table) {
                tracing::warn!("failed to write cache entry {key}: {e}");
            }
        }

        Ok(Fetched {
            table,
            origin: DataOrigin::Remote,
        })
    }

    /// Fetch through the cache, logging failures and returning `None`.
    ///
    /// An empty table is a successful result and comes back as `Some`.
    pub fn get<S: TableSource + ?Sized>(
        &self,
        source: &S,
        params: &QueryParams,
        use_cache: bool,
    ) -> Option<Table> {
        match self.fetch(source, params, use_cache) {
            Ok(fetched) => Some(fetched.table),
            Err(e) => {
                tracing::error!("{e}");
                None
            }
        }
    }

    /// Wrap a source so that every fetch goes through this cache.
    pub fn wrap<'a, S: TableSource + ?Sized>(&'a self, source: &'a S) -> Cached<'a, S> {
        Cached {
            cache: self,
            source,
        }
    }

    /// Load today's entry for `key` if it exists and checks out.
    fn load_valid(&self, key: &CacheKey, today: NaiveDate) -> Option<Table> {
        let path = self.entry_path(key, today);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("cannot read cache file {}: {e}", path.display());
                return None;
            }
        };

        // Entries dropped in by hand have no sidecar; the file name is then
        // the only validity signal.
        if let Some(meta) = self.read_meta(key, today) {
            if let Err(reason) = validate_meta(&meta, key, today, &bytes) {
                tracing::warn!("ignoring cache file {}: {reason}", path.display());
                return None;
            }
        }

        match Table::read_csv(bytes.as_slice()) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!("corrupt cache file {}: {e}", path.display());
                None
            }
        }
    }

    fn read_meta(&self, key: &CacheKey, date: NaiveDate) -> Option<EntryMeta> {
        let path = self.meta_path(key, date);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("unreadable cache metadata {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the entry and its sidecar.
    fn store(
        &self,
        key: &CacheKey,
        date: NaiveDate,
        params: &QueryParams,
        table: &Table,
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| CacheError::Io(format!("failed to create dir: {e}")))?;

        let mut bytes = Vec::new();
        table
            .write_csv(&mut bytes)
            .map_err(|e| CacheError::Io(format!("csv serialization: {e}")))?;

        let path = self.entry_path(key, date);
        write_atomic(&path, &bytes)?;

        let meta = EntryMeta {
            key: key.to_string(),
            operation: key.operation().to_string(),
            fetched_on: date,
            cached_at: self.clock.now(),
            row_count: table.len(),
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
            params: params.clone(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| CacheError::Io(format!("meta serialization: {e}")))?;
        write_atomic(&self.meta_path(key, date), meta_json.as_bytes())?;

        tracing::info!("cached {} rows as {}", table.len(), path.display());
        Ok(())
    }

    /// Delete cache entries.
    ///
    /// With `older_than`, only files whose modification time is at least that
    /// far in the past are removed. Leftover `.tmp` files from interrupted
    /// writes count as cache files. Files in the directory that are not cache
    /// entries are left alone. Individual failures are logged and counted.
    pub fn clear(&self, older_than: Option<Duration>) -> ClearSummary {
        let now = SystemTime::now();
        self.remove_where(|_, metadata| match older_than {
            None => true,
            Some(max_age) => metadata
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .is_some_and(|age| age >= max_age),
        })
    }

    /// Delete every entry not dated today.
    pub fn purge_stale(&self) -> ClearSummary {
        let today = self.clock.today();
        self.remove_where(|parsed, _| parsed.date != today)
    }

    fn remove_where<F>(&self, should_remove: F) -> ClearSummary
    where
        F: FnMut(&ParsedEntryName, &fs::Metadata) -> bool,
    {
        self.remove_where_with(should_remove, |path| fs::remove_file(path))
    }

    fn remove_where_with<F, R>(&self, mut should_remove: F, mut remove: R) -> ClearSummary
    where
        F: FnMut(&ParsedEntryName, &fs::Metadata) -> bool,
        R: FnMut(&Path) -> std::io::Result<()>,
    {
        let mut summary = ClearSummary::default();

        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return summary,
            Err(e) => {
                tracing::warn!("cannot list cache dir {}: {e}", self.cache_dir.display());
                return summary;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(parsed) = name.to_str().and_then(parse_entry_name) else {
                continue;
            };
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("cannot stat {}: {e}", entry.path().display());
                    summary.failed += 1;
                    continue;
                }
            };
            if !should_remove(&parsed, &metadata) {
                continue;
            }

            match remove(&entry.path()) {
                Ok(()) => {
                    summary.removed += 1;
                    summary.bytes_freed += metadata.len();
                }
                Err(e) => {
                    tracing::warn!("failed to delete {}: {e}", entry.path().display());
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "cache cleanup in {}: removed {}, failed {}",
            self.cache_dir.display(),
            summary.removed,
            summary.failed
        );
        summary
    }

    /// List data entries, sorted by key then date.
    pub fn entries(&self) -> Result<Vec<EntryInfo>, CacheError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let today = self.clock.today();

        let dir =
            fs::read_dir(&self.cache_dir).map_err(|e| CacheError::Io(format!("read dir: {e}")))?;

        let mut out = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| CacheError::Io(format!("dir entry: {e}")))?;
            let Some(parsed) = entry.file_name().to_str().and_then(parse_entry_name) else {
                continue;
            };
            if parsed.kind != EntryFile::Data {
                continue;
            }
            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            let meta = self.read_meta(&parsed.key, parsed.date);
            out.push(EntryInfo {
                stale: parsed.date != today,
                key: parsed.key,
                date: parsed.date,
                path: entry.path(),
                size_bytes,
                meta,
            });
        }

        out.sort_by(|a, b| a.key.cmp(&b.key).then(a.date.cmp(&b.date)));
        Ok(out)
    }
}

/// A [`TableSource`] whose fetches go through a [`DailyCache`].
pub struct Cached<'a, S: ?Sized> {
    cache: &'a DailyCache,
    source: &'a S,
}

impl<S: TableSource + ?Sized> TableSource for Cached<'_, S> {
    fn operation(&self) -> &str {
        self.source.operation()
    }

    fn fetch(&self, params: &QueryParams) -> Result<Table, FetchError> {
        match self.cache.fetch(self.source, params, true) {
            Ok(fetched) => Ok(fetched.table),
            Err(CacheError::Fetch { error, .. }) => Err(error),
            Err(other) => Err(FetchError::Other(other.to_string())),
        }
    }
}

fn validate_meta(
    meta: &EntryMeta,
    key: &CacheKey,
    today: NaiveDate,
    bytes: &[u8],
) -> Result<(), String> {
    if meta.key != key.to_string() {
        return Err(format!("metadata key '{}' does not match", meta.key));
    }
    if meta.fetched_on != today {
        return Err(format!("fetched on {}, not today", meta.fetched_on));
    }
    let hash = blake3::hash(bytes).to_hex().to_string();
    if meta.data_hash != hash {
        return Err("data hash mismatch".into());
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(TMP_EXT);
    let tmp_path = PathBuf::from(tmp);

    fs::write(&tmp_path, bytes)
        .map_err(|e| CacheError::Io(format!("write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CacheError::Io(format!("atomic rename failed: {e}"))
    })
}
