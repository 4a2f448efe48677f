//! The alias/release table `emscripten-releases-tags.json`.

use crate::version::version_key;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// `{"aliases": {name: name}, "releases": {version: hash}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasesInfo {
    /// Friendly names (`latest`, `latest-64bit`, ...) to versions or other
    /// aliases.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Release versions to emscripten-releases build hashes.
    #[serde(default)]
    pub releases: BTreeMap<String, String>,
}

impl ReleasesInfo {
    /// Parse the table from JSON text.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Follow aliases until a name that is not an alias is reached.
    ///
    /// A cycle stops at the first name seen twice.
    pub fn resolve_alias(&self, name: &str) -> String {
        let mut seen = HashSet::new();
        let mut current = name.to_string();
        while let Some(next) = self.aliases.get(&current) {
            if !seen.insert(current.clone()) {
                break;
            }
            current.clone_from(next);
        }
        current
    }

    /// Hash of a release given as `version` or `sdk-<version>-64bit`.
    pub fn release_hash(&self, version: &str) -> Option<&str> {
        self.releases
            .get(version)
            .or_else(|| self.releases.get(&format!("sdk-{version}-64bit")))
            .map(String::as_str)
    }

    /// Release version built from `hash`, without any `-suffix`.
    pub fn version_for_hash(&self, hash: &str) -> Option<&str> {
        self.releases
            .iter()
            .find(|(_, h)| h.as_str() == hash)
            .and_then(|(v, _)| v.split('-').next())
    }

    /// Release hashes ordered by ascending version.
    pub fn tags_sorted(&self) -> Vec<String> {
        let mut pairs: Vec<(&String, &String)> = self.releases.iter().collect();
        pairs.sort_by_key(|(v, _)| version_key(v));
        pairs.into_iter().map(|(_, h)| h.clone()).collect()
    }

    /// Release versions, newest first.
    pub fn versions_sorted_desc(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.releases.keys().map(String::as_str).collect();
        versions.sort_by_key(|v| std::cmp::Reverse(version_key(v)));
        versions
    }

    /// Version the `latest` alias points at.
    pub fn latest_version(&self) -> String {
        self.resolve_alias("latest")
    }

    /// Hash of the `latest` release, if it is in the table.
    pub fn latest_hash(&self) -> Option<&str> {
        self.releases
            .get(&self.latest_version())
            .map(String::as_str)
    }
}
