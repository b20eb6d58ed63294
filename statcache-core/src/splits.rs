//! Split selectors and the `splitArr` codec.
//!
//! A split filters leaderboard stats by a situational condition (batter vs
//! pitcher handedness). The remote source takes them as a comma-joined list of
//! integer codes, e.g. `splitArr=5,96` for "vs LHH" and "as RHP".
//!
//! Callers may name splits several ways; [`format_split_array`] normalizes all
//! of them to the canonical wire string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from resolving split selectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("unknown split name '{0}' (expected one of VS_LHH, VS_RHH, AS_RHP, AS_LHP)")]
    UnknownSplitName(String),

    #[error("invalid split type: {0}")]
    InvalidSplitType(String),
}

/// Named split codes understood by the remote leaderboard.
///
/// The name/code bindings are part of the remote parameter contract and must
/// not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    /// vs left-handed hitters
    #[serde(rename = "VS_LHH")]
    VsLhh,
    /// vs right-handed hitters
    #[serde(rename = "VS_RHH")]
    VsRhh,
    /// as right-handed pitcher
    #[serde(rename = "AS_RHP")]
    AsRhp,
    /// as left-handed pitcher
    #[serde(rename = "AS_LHP")]
    AsLhp,
}

impl Split {
    pub const ALL: [Split; 4] = [Split::VsLhh, Split::VsRhh, Split::AsRhp, Split::AsLhp];

    /// Integer code sent in `splitArr`.
    pub const fn code(self) -> i64 {
        match self {
            Split::VsLhh => 5,
            Split::VsRhh => 6,
            Split::AsRhp => 96,
            Split::AsLhp => 97,
        }
    }

    /// Symbolic name, e.g. `VS_LHH`.
    pub const fn name(self) -> &'static str {
        match self {
            Split::VsLhh => "VS_LHH",
            Split::VsRhh => "VS_RHH",
            Split::AsRhp => "AS_RHP",
            Split::AsLhp => "AS_LHP",
        }
    }

    pub fn from_code(code: i64) -> Option<Split> {
        Split::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Split {
    type Err = SplitError;

    /// Case-insensitive lookup by symbolic name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Split::ALL
            .into_iter()
            .find(|split| split.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SplitError::UnknownSplitName(s.to_string()))
    }
}

/// One element of a split selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitItem {
    Split(Split),
    Code(i64),
    Name(String),
}

impl SplitItem {
    /// Resolve to the integer code.
    pub fn resolve(&self) -> Result<i64, SplitError> {
        match self {
            SplitItem::Split(split) => Ok(split.code()),
            SplitItem::Code(code) => Ok(*code),
            SplitItem::Name(name) => name.parse::<Split>().map(Split::code),
        }
    }

    fn from_json(value: &serde_json::Value) -> Result<Self, SplitError> {
        match value {
            serde_json::Value::String(s) => Ok(SplitItem::Name(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(SplitItem::Code)
                .ok_or_else(|| SplitError::InvalidSplitType(format!("non-integer number {n}"))),
            other => Err(SplitError::InvalidSplitType(json_type_name(other).to_string())),
        }
    }
}

impl From<Split> for SplitItem {
    fn from(split: Split) -> Self {
        SplitItem::Split(split)
    }
}

impl From<i64> for SplitItem {
    fn from(code: i64) -> Self {
        SplitItem::Code(code)
    }
}

impl From<i32> for SplitItem {
    fn from(code: i32) -> Self {
        SplitItem::Code(i64::from(code))
    }
}

impl From<&str> for SplitItem {
    fn from(name: &str) -> Self {
        SplitItem::Name(name.to_string())
    }
}

impl From<String> for SplitItem {
    fn from(name: String) -> Self {
        SplitItem::Name(name)
    }
}

/// Any accepted way of naming one or more splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSelector {
    One(SplitItem),
    Many(Vec<SplitItem>),
    /// Comma-joined string, passed through untouched.
    Joined(String),
}

impl SplitSelector {
    /// Build a selector from untyped input (config files, JSON payloads).
    ///
    /// Strings follow the same comma rule as [`From<&str>`]; arrays become
    /// `Many`. Anything that is neither an integer nor a string is rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SplitError> {
        match value {
            serde_json::Value::String(s) => Ok(SplitSelector::from(s.as_str())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(SplitItem::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(SplitSelector::Many),
            other => SplitItem::from_json(other).map(SplitSelector::One),
        }
    }

    /// Canonical `splitArr` string for this selector.
    pub fn to_param(&self) -> Result<String, SplitError> {
        let items = match self {
            SplitSelector::Joined(joined) => return Ok(joined.clone()),
            SplitSelector::One(item) => std::slice::from_ref(item),
            SplitSelector::Many(items) => items.as_slice(),
        };

        let codes = items
            .iter()
            .map(|item| item.resolve().map(|code| code.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes.join(","))
    }
}

impl From<SplitItem> for SplitSelector {
    fn from(item: SplitItem) -> Self {
        SplitSelector::One(item)
    }
}

impl From<Split> for SplitSelector {
    fn from(split: Split) -> Self {
        SplitSelector::One(split.into())
    }
}

impl From<i64> for SplitSelector {
    fn from(code: i64) -> Self {
        SplitSelector::One(code.into())
    }
}

impl From<i32> for SplitSelector {
    fn from(code: i32) -> Self {
        SplitSelector::One(code.into())
    }
}

impl From<&str> for SplitSelector {
    fn from(s: &str) -> Self {
        if s.contains(',') {
            SplitSelector::Joined(s.to_string())
        } else {
            SplitSelector::One(SplitItem::Name(s.to_string()))
        }
    }
}

impl From<String> for SplitSelector {
    fn from(s: String) -> Self {
        SplitSelector::from(s.as_str())
    }
}

impl<T: Into<SplitItem>> From<Vec<T>> for SplitSelector {
    fn from(items: Vec<T>) -> Self {
        SplitSelector::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SplitItem> + Clone> From<&[T]> for SplitSelector {
    fn from(items: &[T]) -> Self {
        SplitSelector::Many(items.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<SplitItem>, const N: usize> From<[T; N]> for SplitSelector {
    fn from(items: [T; N]) -> Self {
        SplitSelector::Many(items.into_iter().map(Into::into).collect())
    }
}

/// Normalize a split selector to the `splitArr` wire format (`"5,96"`).
///
/// Order and duplicates are preserved. A string that already contains a comma
/// is returned as-is, which makes the function idempotent on its own output.
pub fn format_split_array(splits: impl Into<SplitSelector>) -> Result<String, SplitError> {
    splits.into().to_param()
}

/// Interpret a command-line token: integer text is a raw code, anything else
/// is a split name.
pub fn parse_split_arg(arg: &str) -> SplitItem {
    match arg.trim().parse::<i64>() {
        Ok(code) => SplitItem::Code(code),
        Err(_) => SplitItem::Name(arg.to_string()),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "nested array",
        serde_json::Value::Object(_) => "object",
    }
}
