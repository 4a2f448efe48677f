//! Records of `emsdk_manifest.json`.
//!
//! The manifest is a flat document of tool and SDK definitions. A definition
//! whose `version` carries a category placeholder (see [`Category`]) is a
//! template: the loader clones it once per entry of the matching tag list and
//! substitutes the token everywhere with [`ItemDef::substitute`].

use crate::types::ItemName;
use crate::version::CmpOp;
use serde::{Deserialize, Serialize};

/// The whole manifest document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDoc {
    /// Tool definitions in manifest order (oldest first).
    #[serde(default)]
    pub tools: Vec<ItemDef>,
    /// SDK bundle definitions in manifest order (oldest first).
    #[serde(default)]
    pub sdks: Vec<ItemDef>,
}

impl ManifestDoc {
    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON and on unknown hook names.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Custom step run instead of, or after, the regular fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallHook {
    /// Clone LLVM and build it with CMake.
    BuildLlvm,
    /// Clone ninja and build it with CMake.
    BuildNinja,
    /// Clone ccache and build it with CMake.
    BuildCcache,
    /// Build binaryen from a fetched source tree.
    BuildBinaryen,
    /// Run `npm ci` inside the emscripten tree.
    EmscriptenNpmInstall,
}

impl InstallHook {
    /// Hooks that do their own fetching and replace the download step.
    pub fn replaces_fetch(self) -> bool {
        matches!(self, Self::BuildLlvm | Self::BuildNinja | Self::BuildCcache)
    }
}

/// Custom step run before an item's tree is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UninstallHook {
    /// Remove binaryen's out-of-tree build directory.
    UninstallBinaryen,
}

/// Custom replacement for the content and stamp checks of `is_installed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstalledCheckHook {
    /// Look for binaryen's build output.
    IsBinaryenInstalled,
}

/// `[param, op, reference]`: keep an expanded entry only when the tag
/// substituted for `param` compares to `reference` with `op`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFilter(pub String, pub CmpOp, pub String);

impl VersionFilter {
    /// Whether `version`, substituted for `param`, passes this filter.
    /// Filters for other parameters always pass.
    pub fn passes(&self, param: &str, version: &str) -> bool {
        self.0 != param || self.1.apply(version, &self.2)
    }
}

/// Version placeholder categories, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `%tag%`: legacy emscripten tags
    Tag,
    /// `%precompiled_tag%`: precompiled LLVM builds of either bitness
    PrecompiledTag,
    /// `%precompiled_tag32%`: 32-bit precompiled LLVM builds
    PrecompiledTag32,
    /// `%precompiled_tag64%`: 64-bit precompiled LLVM builds
    PrecompiledTag64,
    /// `%binaryen_tag%`: legacy binaryen tags
    BinaryenTag,
    /// `%releases-tag%`: emscripten-releases build hashes
    ReleasesTag,
}

impl Category {
    /// All categories in the order they are tested.
    pub const ALL: [Self; 6] = [
        Self::Tag,
        Self::PrecompiledTag,
        Self::PrecompiledTag32,
        Self::PrecompiledTag64,
        Self::BinaryenTag,
        Self::ReleasesTag,
    ];

    /// The placeholder token.
    pub fn token(self) -> &'static str {
        match self {
            Self::Tag => "%tag%",
            Self::PrecompiledTag => "%precompiled_tag%",
            Self::PrecompiledTag32 => "%precompiled_tag32%",
            Self::PrecompiledTag64 => "%precompiled_tag64%",
            Self::BinaryenTag => "%binaryen_tag%",
            Self::ReleasesTag => "%releases-tag%",
        }
    }

    /// First category whose token occurs in `version`.
    pub fn detect(version: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| version.contains(c.token()))
    }
}

/// One tool or SDK definition.
///
/// Every field other than `id` is optional in the JSON document. Absent
/// strings stay `None` so "not declared" is distinguishable from "empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Category, e.g. `node`, `llvm`, `sdk`.
    #[serde(default)]
    pub id: String,
    /// Version string, possibly holding a category placeholder.
    #[serde(default)]
    pub version: String,
    /// 32 or 64 when the item is bitness-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitness: Option<u32>,
    /// Whether the default install path gets a `_<bitness>bit` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_bitness: Option<bool>,
    /// Host OS filter (`win`, `linux`, `macos`, `unix`, `all`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Host architecture filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Download URL used when no OS-specific one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Download URL for Windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_url: Option<String>,
    /// Download URL for macOS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macos_url: Option<String>,
    /// Download URL for Linux.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_url: Option<String>,
    /// Download URL for any Unix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_url: Option<String>,
    /// Install path template, relative to the emsdk root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_path: Option<String>,
    /// Names of the items this one depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uses: Vec<String>,
    /// Branch tracked by a git-sourced item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Install hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_install_script: Option<InstallHook>,
    /// Uninstall hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_uninstall_script: Option<UninstallHook>,
    /// Installed-check hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_is_installed_script: Option<InstalledCheckHook>,
    /// `;`-separated directories added to `PATH` on activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_path: Option<String>,
    /// Program whose presence elsewhere on `PATH` suppresses `activated_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_path_skip: Option<String>,
    /// `;`-separated `KEY=value` environment assignments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_env: Option<String>,
    /// `;`-separated `KEY='value'` entries for `.emscripten`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_cfg: Option<String>,
    /// CMake build type; its presence marks the item as built from source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmake_build_type: Option<String>,
    /// Prefix for the downloaded archive's file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_prefix: Option<String>,
    /// emscripten-releases hash this item was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emscripten_releases_hash: Option<String>,
    /// Filters applied to template expansions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_filter: Vec<VersionFilter>,
    /// Set by the loader for all but the newest two expansions of a template.
    #[serde(skip)]
    pub is_old: bool,
}

impl ItemDef {
    /// Registry key of this definition.
    pub fn name(&self) -> ItemName {
        ItemName::compose(&self.id, &self.version, self.bitness)
    }

    /// Clone with `token` replaced by `value` in every string field and in
    /// `uses`.
    ///
    /// Returns `None` when no string field contained the token; `uses` alone
    /// does not count.
    pub fn substitute(&self, token: &str, value: &str) -> Option<Self> {
        let mut out = self.clone();
        let mut touched = false;

        let mut replace = |field: &mut String| {
            if field.contains(token) {
                *field = field.replace(token, value);
                touched = true;
            }
        };
        replace(&mut out.id);
        replace(&mut out.version);
        for field in [
            &mut out.os,
            &mut out.arch,
            &mut out.url,
            &mut out.windows_url,
            &mut out.macos_url,
            &mut out.linux_url,
            &mut out.unix_url,
            &mut out.install_path,
            &mut out.git_branch,
            &mut out.activated_path,
            &mut out.activated_path_skip,
            &mut out.activated_env,
            &mut out.activated_cfg,
            &mut out.cmake_build_type,
            &mut out.download_prefix,
            &mut out.emscripten_releases_hash,
        ]
        .into_iter()
        .flatten()
        {
            replace(field);
        }

        if !touched {
            return None;
        }
        for dep in &mut out.uses {
            *dep = dep.replace(token, value);
        }
        Some(out)
    }
}
