//! Manifest loading and template expansion.
//!
//! A template definition is cloned once per entry of its tag list. Only the
//! newest [`NON_OLD_COUNT`] expansions of each template are shown by default;
//! the rest are marked `is_old`.

use crate::error::{Error, Result};
use crate::item::Item;
use crate::paths::Layout;
use crate::registry::Registry;
use crate::releases::installed_sdk_version;
use emsdk_schema::{Category, Host, ItemDef, ManifestDoc, ReleasesInfo, version_key};
use std::fs;
use std::path::Path;
use tracing::debug;

/// How many of the newest expansions of a template are not old.
pub const NON_OLD_COUNT: usize = 2;

/// The tag lists templates expand against, each oldest first.
#[derive(Debug, Clone, Default)]
pub struct TagLists {
    pub emscripten: Vec<String>,
    pub binaryen: Vec<String>,
    pub precompiled32: Vec<String>,
    pub precompiled64: Vec<String>,
    pub releases: Vec<String>,
}

impl TagLists {
    /// Read every tag list under the root. Missing files yield empty lists.
    ///
    /// `extra_release_tag` is appended to the release hashes, as is the hash
    /// of the installed release SDK when the table does not list it.
    pub fn load(layout: &Layout, info: &ReleasesInfo, extra_release_tag: Option<&str>) -> Self {
        let mut releases = info.tags_sorted();
        if let Some(tag) = extra_release_tag {
            releases.push(tag.to_string());
        }
        if let Some(installed) = installed_sdk_version(layout) {
            if !releases.contains(&installed) {
                debug!("adding installed release tag {installed}");
                releases.push(installed);
            }
        }
        Self {
            emscripten: read_lines(&layout.legacy_emscripten_tags_path()),
            binaryen: read_lines(&layout.legacy_binaryen_tags_path()),
            precompiled32: Vec::new(),
            precompiled64: load_file_index_list(&layout.llvm_tags_64bit_path()),
            releases,
        }
    }

    fn for_category(&self, category: Category) -> Vec<String> {
        match category {
            Category::Tag => self.emscripten.clone(),
            Category::PrecompiledTag => {
                let mut all = self.precompiled32.clone();
                all.extend(self.precompiled64.iter().cloned());
                all
            }
            Category::PrecompiledTag32 => self.precompiled32.clone(),
            Category::PrecompiledTag64 => self.precompiled64.clone(),
            Category::BinaryenTag => self.binaryen.clone(),
            Category::ReleasesTag => self.releases.clone(),
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            debug!("tag list {} unavailable: {e}", path.display());
            Vec::new()
        }
    }
}

/// Read an archive index (`emscripten-llvm-e<version>.tar.gz` per line) as
/// bare versions sorted oldest first.
fn load_file_index_list(path: &Path) -> Vec<String> {
    let mut items: Vec<String> = read_lines(path)
        .into_iter()
        .map(|x| {
            x.replace(".tar.gz", "")
                .replace(".zip", "")
                .replace("emscripten-llvm-e", "")
        })
        .filter(|x| !x.is_empty() && !x.contains("latest"))
        .collect();
    items.sort_by_key(|v| version_key(v));
    items
}

/// Parse `emsdk_manifest.json`.
pub fn read_manifest(layout: &Layout) -> Result<ManifestDoc> {
    let path = layout.manifest_path();
    let text = fs::read_to_string(&path).map_err(|e| Error::Manifest {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    ManifestDoc::from_json(&text).map_err(|e| Error::Manifest {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Build the registry for `host`, expanding templates against `tags`.
pub fn load_registry(doc: &ManifestDoc, tags: &TagLists, host: &Host) -> Result<Registry> {
    let mut registry = Registry::new();

    for def in &doc.tools {
        if !Item::new(def.clone(), false).compatible_with(host) {
            continue;
        }
        match Category::detect(&def.version) {
            Some(category) => expand(&mut registry, def, category, &tags.for_category(category), false)?,
            None => registry.add_tool(def.clone())?,
        }
    }

    for def in &doc.sdks {
        let mut def = def.clone();
        def.id = "sdk".to_string();
        if !Item::new(def.clone(), true).compatible_with(host) {
            continue;
        }
        match Category::detect(&def.version) {
            Some(category) => expand(&mut registry, &def, category, &tags.for_category(category), true)?,
            None => {
                if dependencies_exist(&registry, &def) {
                    registry.add_sdk(def)?;
                }
            }
        }
    }

    Ok(registry)
}

fn expand(registry: &mut Registry, template: &ItemDef, category: Category, list: &[String], is_sdk: bool) -> Result<()> {
    let token = category.token();
    for (i, tag) in list.iter().enumerate() {
        if tag.trim().is_empty() {
            continue;
        }
        let Some(mut def) = template.substitute(token, tag) else {
            continue;
        };
        def.is_old = i + NON_OLD_COUNT < list.len();
        if !def.version_filter.iter().all(|f| f.passes(token, tag)) {
            continue;
        }
        let name = def.name();
        if is_sdk {
            if !dependencies_exist(registry, &def) {
                continue;
            }
            if registry.find_sdk(name.as_str()).is_some() {
                debug!("SDK {name} already existed in manifest, not adding twice");
                continue;
            }
            registry.add_sdk(def)?;
        } else {
            if registry.find_tool(name.as_str()).is_some() {
                debug!("Tool {name} already existed in manifest, not adding twice");
                continue;
            }
            registry.add_tool(def)?;
        }
    }
    Ok(())
}

fn dependencies_exist(registry: &Registry, def: &ItemDef) -> bool {
    def.uses.iter().all(|dep| {
        let found = registry.find_tool(dep).is_some();
        if !found {
            debug!("missing dependency: {dep}");
        }
        found
    })
}
