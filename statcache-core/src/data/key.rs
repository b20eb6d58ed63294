//! Cache keys and entry file names.
//!
//! Key: `{operation}_{hash8}`, where `hash8` is the first 8 hex chars of a
//! BLAKE3 digest over the canonical JSON of the non-null parameters.
//! Entry file: `{key}_{YYYY-MM-DD}.csv`, with a `.meta.json` sidecar.
//! Either may briefly exist with a `.tmp` suffix while being written.

use super::params::{ParamValue, QueryParams};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of hex characters kept from the digest.
pub const HASH_LEN: usize = 8;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;

pub const DATA_EXT: &str = ".csv";
pub const META_EXT: &str = ".meta.json";
/// Suffix of a file still being written; renamed into place when complete.
pub const TMP_EXT: &str = ".tmp";

/// Identity of a fetch: operation name plus a digest of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    operation: String,
    hash: String,
}

impl CacheKey {
    /// Compute the key for `operation` called with `params`.
    ///
    /// Null parameters are skipped, so an explicit `None` and an omitted
    /// argument produce the same key.
    pub fn compute(operation: &str, params: &QueryParams) -> Self {
        let canonical: BTreeMap<&str, &ParamValue> = params.non_null().collect();
        // BTreeMap of plain values: serialization cannot fail.
        let json = serde_json::to_string(&canonical).unwrap_or_default();
        let digest = blake3::hash(json.as_bytes()).to_hex();
        Self {
            operation: operation.to_string(),
            hash: digest[..HASH_LEN].to_string(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// `{key}_{date}.csv`
    pub fn data_file_name(&self, date: NaiveDate) -> String {
        format!("{self}_{}{DATA_EXT}", date.format(DATE_FORMAT))
    }

    /// `{key}_{date}.meta.json`
    pub fn meta_file_name(&self, date: NaiveDate) -> String {
        format!("{self}_{}{META_EXT}", date.format(DATE_FORMAT))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.operation, self.hash)
    }
}

/// Which half of an entry a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFile {
    Data,
    Meta,
    /// A half-written data or sidecar file. Never read, only cleaned up.
    Temp,
}

/// A file name decoded back into its key and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntryName {
    pub key: CacheKey,
    pub date: NaiveDate,
    pub kind: EntryFile,
}

/// Decode `{operation}_{hash8}_{YYYY-MM-DD}.csv` (or `.meta.json`, or either
/// with a trailing `.tmp`).
///
/// Returns `None` for anything else, which is how the cache tells its own
/// files apart from unrelated files in the same directory.
pub fn parse_entry_name(file_name: &str) -> Option<ParsedEntryName> {
    if let Some(inner) = file_name.strip_suffix(TMP_EXT) {
        return parse_complete_name(inner).map(|parsed| ParsedEntryName {
            kind: EntryFile::Temp,
            ..parsed
        });
    }
    parse_complete_name(file_name)
}

fn parse_complete_name(file_name: &str) -> Option<ParsedEntryName> {
    let (stem, kind) = if let Some(stem) = file_name.strip_suffix(META_EXT) {
        (stem, EntryFile::Meta)
    } else if let Some(stem) = file_name.strip_suffix(DATA_EXT) {
        (stem, EntryFile::Data)
    } else {
        return None;
    };

    // stem = {operation}_{hash8}_{date}
    let date_start = stem.len().checked_sub(DATE_LEN)?;
    let (rest, date_str) = (stem.get(..date_start)?, stem.get(date_start..)?);
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).ok()?;

    let rest = rest.strip_suffix('_')?;
    let hash_start = rest.len().checked_sub(HASH_LEN)?;
    let (operation, hash) = (rest.get(..hash_start)?, rest.get(hash_start..)?);
    if !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let operation = operation.strip_suffix('_')?;
    if operation.is_empty() {
        return None;
    }

    Some(ParsedEntryName {
        key: CacheKey {
            operation: operation.to_string(),
            hash: hash.to_ascii_lowercase(),
        },
        date,
        kind,
    })
}
