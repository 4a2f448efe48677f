//! The in-memory registry of tools and SDKs.
//!
//! Both collections keep manifest load order, oldest first, so "newest" is
//! always "last". Lookups go through a name index built alongside.

use crate::error::{Error, Result};
use crate::item::Item;
use emsdk_schema::ItemDef;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct Registry {
    tools: Vec<Item>,
    sdks: Vec<Item>,
    tool_index: HashMap<String, usize>,
    sdk_index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool. A second tool with the same name is an internal error.
    pub fn add_tool(&mut self, def: ItemDef) -> Result<()> {
        let item = Item::new(def, false);
        if self.tool_index.contains_key(item.name.as_str()) {
            return Err(Error::DuplicateItem(item.name.to_string()));
        }
        self.tool_index.insert(item.name.to_string(), self.tools.len());
        self.tools.push(item);
        Ok(())
    }

    /// Insert an SDK. A second SDK with the same name is an internal error.
    pub fn add_sdk(&mut self, def: ItemDef) -> Result<()> {
        let item = Item::new(def, true);
        if self.sdk_index.contains_key(item.name.as_str()) {
            return Err(Error::DuplicateItem(item.name.to_string()));
        }
        self.sdk_index.insert(item.name.to_string(), self.sdks.len());
        self.sdks.push(item);
        Ok(())
    }

    pub fn tools(&self) -> &[Item] {
        &self.tools
    }

    pub fn sdks(&self) -> &[Item] {
        &self.sdks
    }

    pub fn find_tool(&self, name: &str) -> Option<&Item> {
        self.tool_index.get(name).map(|&i| &self.tools[i])
    }

    pub fn find_sdk(&self, name: &str) -> Option<&Item> {
        self.sdk_index.get(name).map(|&i| &self.sdks[i])
    }

    /// Look a name up among tools first, then SDKs.
    pub fn find(&self, name: &str) -> Option<&Item> {
        self.find_tool(name).or_else(|| self.find_sdk(name))
    }

    /// Like [`Registry::find`], failing with the error the user should see.
    ///
    /// A `-64bit` name on a 32-bit host is reported as unsupported rather
    /// than unknown.
    pub fn lookup(&self, name: &str, host: &emsdk_schema::Host) -> Result<&Item> {
        self.find(name).ok_or_else(|| {
            if name.ends_with("-64bit") && !host.is_64bit() {
                Error::Unsupported(format!("'{name}' is only provided for 64-bit OSes"))
            } else {
                Error::UnknownItem(name.to_string())
            }
        })
    }

    /// Direct dependencies that exist as tools; missing ones are skipped.
    pub fn dependencies(&self, item: &Item) -> Vec<&Item> {
        item.def
            .uses
            .iter()
            .filter_map(|name| self.find_tool(name))
            .collect()
    }

    /// Depth-first dependency list: each direct dependency followed by its
    /// own recursive dependencies.
    pub fn recursive_dependencies(&self, item: &Item) -> Vec<&Item> {
        let mut out = Vec::new();
        let mut stack = vec![item.name.to_string()];
        self.collect_recursive(item, &mut out, &mut stack);
        out
    }

    fn collect_recursive<'a>(
        &'a self,
        item: &Item,
        out: &mut Vec<&'a Item>,
        stack: &mut Vec<String>,
    ) {
        for dep in self.dependencies(item) {
            if stack.iter().any(|s| s == dep.name.as_str()) {
                debug!("dependency cycle through {}, not following", dep.name);
                continue;
            }
            out.push(dep);
            stack.push(dep.name.to_string());
            self.collect_recursive(dep, out, stack);
            stack.pop();
        }
    }

    /// Whether the item, or anything it depends on, is built from source.
    pub fn needs_compilation(&self, item: &Item) -> bool {
        if item.def.cmake_build_type.is_some() {
            return true;
        }
        item.def.uses.iter().any(|name| match self.find_tool(name) {
            Some(dep) => self.needs_compilation(dep),
            None => {
                debug!("Tool {} depends on {name} which does not exist!", item.name);
                false
            }
        })
    }

    /// Point a git-sourced tool at a different repository and refspec.
    pub fn apply_override(&mut self, ov: &RepositoryOverride) -> Result<()> {
        let idx = *self
            .tool_index
            .get(&ov.tool)
            .ok_or_else(|| Error::UnknownItem(ov.tool.clone()))?;
        let tool = &mut self.tools[idx];
        debug!(
            "Reading git repository URL \"{}\" and git branch \"{}\" for Tool \"{}\".",
            ov.url, ov.refspec, ov.tool
        );
        tool.def.url = Some(ov.url.clone());
        tool.def.git_branch = Some(ov.refspec.clone());
        Ok(())
    }
}

/// `tool@url` given to `install --override-repository`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOverride {
    pub tool: String,
    pub url: String,
    pub refspec: String,
}

impl FromStr for RepositoryOverride {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (tool, rest) = s
            .split_once('@')
            .ok_or_else(|| Error::MalformedOverride(s.to_string()))?;
        let (url, refspec) = parse_github_url_and_refspec(rest)?;
        Ok(Self {
            tool: tool.to_string(),
            url,
            refspec,
        })
    }
}

/// Split `https://github.com/o/r/tree/<ref>` (or `/commit/<sha>`) into the
/// repository URL and the refspec. Without either marker the refspec is
/// `main`.
pub fn parse_github_url_and_refspec(url: &str) -> Result<(String, String)> {
    if url.is_empty() {
        return Ok((String::new(), String::new()));
    }
    if ["/tree/", "/tree", "/commit/", "/commit"]
        .iter()
        .any(|s| url.ends_with(s))
    {
        return Err(Error::MalformedOverride(url.to_string()));
    }
    for marker in ["/tree/", "/commit/"] {
        if let Some((repo, refspec)) = url.split_once(marker) {
            if url.ends_with('/') {
                return Err(Error::MalformedOverride(url.to_string()));
            }
            return Ok((repo.to_string(), refspec.to_string()));
        }
    }
    Ok((url.to_string(), "main".to_string()))
}
