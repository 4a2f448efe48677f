//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Unique registry key of a tool or SDK, e.g. `node-18.20.3-64bit`.
///
/// Names are case-sensitive and built from `id`, `version` and `bitness` by
/// [`ItemName::compose`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Wrap an existing name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Build `id[-version][-<bitness>bit]`.
    ///
    /// ```
    /// use emsdk_schema::ItemName;
    ///
    /// assert_eq!(ItemName::compose("node", "18.20.3", Some(64)).as_str(), "node-18.20.3-64bit");
    /// assert_eq!(ItemName::compose("sdk", "", None).as_str(), "sdk");
    /// ```
    pub fn compose(id: &str, version: &str, bitness: Option<u32>) -> Self {
        let mut name = id.to_string();
        if !version.is_empty() {
            name.push('-');
            name.push_str(version);
        }
        if let Some(bits) = bitness {
            name.push('-');
            name.push_str(&bits.to_string());
            name.push_str("bit");
        }
        Self(name)
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ItemName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ItemName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ItemName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for ItemName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemName {
    fn from(s: String) -> Self {
        Self(s)
    }
}
