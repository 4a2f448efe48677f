//! Numeric version ordering.
//!
//! Tag lists and release tables are keyed by strings such as `1.38.10`,
//! `3.1.45-git` or `1.39.0_64bit`. Sorting them lexically puts `1.38.10`
//! before `1.38.2`, so everything that orders versions goes through
//! [`version_key`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sortable key built from the first three numeric components of a version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionKey(pub Vec<u64>);

impl VersionKey {
    /// The numeric components.
    pub fn parts(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Build the ordering key for a version string.
///
/// The string is split on `.`, `_` and `-` and the first three components
/// are read as integers. A component that does not start with a digit counts
/// as zero; trailing garbage after the digits is ignored.
///
/// ```
/// use emsdk_schema::version_key;
///
/// assert!(version_key("1.38.2") < version_key("1.38.10"));
/// assert!(version_key("1.9.0") < version_key("1.10.0"));
/// ```
pub fn version_key(version: &str) -> VersionKey {
    VersionKey(
        version
            .split(['.', '_', '-'])
            .take(3)
            .map(leading_number)
            .collect(),
    )
}

fn leading_number(component: &str) -> u64 {
    let digits: &str = component
        .find(|c: char| !c.is_ascii_digit())
        .map_or(component, |end| &component[..end]);
    digits.parse().unwrap_or(0)
}

/// Parse the contents of an `emscripten-version.txt` file.
///
/// The file holds a quoted version such as `"3.1.45"` or `"3.1.46-git"`.
/// Returns `None` when no numeric component can be read.
pub fn parse_emscripten_version(contents: &str) -> Option<Vec<u64>> {
    let trimmed = contents.trim().trim_matches('"');
    let release = trimmed.split('-').next()?;
    release
        .split('.')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Comparison operator of a manifest `version_filter` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
}

impl CmpOp {
    /// Compare `version` against `reference` by [`version_key`].
    pub fn apply(self, version: &str, reference: &str) -> bool {
        let (a, b) = (version_key(version), version_key(reference));
        match self {
            Self::Le => a <= b,
            Self::Lt => a < b,
            Self::Ge => a >= b,
            Self::Gt => a > b,
            Self::Eq => a == b,
            Self::Ne => a != b,
        }
    }
}
