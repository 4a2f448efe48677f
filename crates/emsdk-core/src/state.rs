//! Installed/active queries against the disk, the config and the environment.

use crate::cmake;
use crate::config::EmConfig;
use crate::context::Context;
use crate::env::{EnvSnapshot, normalized_contains};
use crate::fsutil::is_nonempty_directory;
use crate::item::Item;
use crate::paths::to_unix_path;
use crate::registry::Registry;
use emsdk_schema::InstalledCheckHook;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only view used to answer "is it installed / active" questions.
pub struct State<'a> {
    pub ctx: &'a Context,
    pub registry: &'a Registry,
    pub config: EmConfig,
}

impl<'a> State<'a> {
    /// Snapshot the config currently on disk.
    pub fn load(ctx: &'a Context, registry: &'a Registry) -> Self {
        Self {
            ctx,
            registry,
            config: EmConfig::load(&ctx.layout),
        }
    }

    /// Installed means: every dependency installed, and for items with a
    /// download the install directory is non-empty, the activated paths
    /// exist, and the stamp matches the name (unless `skip_version_check`).
    pub fn is_installed(&self, item: &Item, skip_version_check: bool) -> bool {
        for dep in &item.def.uses {
            match self.registry.find_tool(dep) {
                Some(tool) => {
                    if !self.is_installed(tool, false) {
                        return false;
                    }
                }
                None => {
                    warn!("Manifest error: No tool by name '{dep}' found! This may indicate an internal SDK error!");
                    return false;
                }
            }
        }

        if item.download_url(&self.ctx.host).is_none() {
            return true;
        }

        let mut content_exists = is_nonempty_directory(&item.installation_path(self.ctx));
        if item.def.activated_path.is_some()
            && !item.activated_paths(self.ctx).iter().all(|p| Path::new(p).exists())
        {
            content_exists = false;
        }

        if let Some(InstalledCheckHook::IsBinaryenInstalled) = item.def.custom_is_installed_script {
            return cmake::binaryen_build_root(self.ctx, item).exists();
        }

        if skip_version_check {
            content_exists
        } else {
            content_exists && self.is_installed_version(item)
        }
    }

    /// Whether the stamp under the install path names this item.
    pub fn is_installed_version(&self, item: &Item) -> bool {
        let path = item.version_file_path(self.ctx);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let stamp = text.trim();
                if stamp != item.name.as_str() {
                    debug!("version file {} does not match: '{stamp}' != '{}'", path.display(), item.name);
                }
                stamp == item.name.as_str()
            }
            Err(_) => {
                debug!("version file not found: {}", path.display());
                false
            }
        }
    }

    /// Installed, dependencies active, and every `activated_cfg` entry
    /// recorded in `.emscripten`. An item with no config entries is active
    /// only through its dependencies.
    pub fn is_active(&self, item: &Item) -> bool {
        if !self.is_installed(item, false) {
            return false;
        }
        let deps = self.registry.dependencies(item);
        if !deps.iter().all(|dep| self.is_active(dep)) {
            return false;
        }
        let cfg = item.activated_config(self.ctx);
        if cfg.is_empty() {
            return !deps.is_empty();
        }
        cfg.iter()
            .all(|(key, value)| self.config.normalized(key).as_deref() == Some(value.as_str()))
    }

    /// Whether `env` reflects this item's environment and `PATH` entries.
    pub fn is_env_active(&self, item: &Item, env: &EnvSnapshot) -> bool {
        for (key, value) in item.activated_environment(self.ctx) {
            if !env.has_value(&key, &value) {
                return false;
            }
        }
        let path = to_unix_path(env.path());
        let entries: Vec<&str> = path.split(self.ctx.host.path_separator()).collect();
        item.activated_paths(self.ctx)
            .iter()
            .all(|p| normalized_contains(&entries, p))
    }

    /// Newest installed tool of category `id`.
    pub fn find_latest_installed_tool(&self, id: &str) -> Option<&'a Item> {
        self.registry
            .tools()
            .iter()
            .rev()
            .find(|t| t.id() == id && self.is_installed(t, false))
    }

    pub fn currently_active_tools(&self) -> Vec<&'a Item> {
        self.registry
            .tools()
            .iter()
            .filter(|t| self.is_active(t))
            .collect()
    }

    /// Newest SDK whose tools are all active.
    pub fn currently_active_sdk(&self) -> Option<&'a Item> {
        self.registry.sdks().iter().rev().find(|s| self.is_active(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Layout;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Host, ItemDef, Os};
    use tempfile::{TempDir, tempdir};

    fn def(json: &str) -> ItemDef {
        serde_json::from_str(json).unwrap()
    }

    fn setup() -> (TempDir, Context, Registry) {
        let dir = tempdir().unwrap();
        let ctx = Context::new(Layout::new(dir.path()), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let mut reg = Registry::new();
        reg.add_tool(def(
            r#"{"id":"node","version":"1","install_path":"node/1","url":"node.tar.gz",
                "activated_path":"%installation_dir%/bin","activated_cfg":"NODE_JS='%installation_dir%/bin/node'",
                "activated_env":"EMSDK_NODE=%installation_dir%/bin/node"}"#,
        ))
        .unwrap();
        reg.add_sdk(def(r#"{"id":"sdk","version":"1","uses":["node-1"]}"#)).unwrap();
        (dir, ctx, reg)
    }

    fn install_node(ctx: &Context) {
        let bin = ctx.layout.root().join("node/1/bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("node"), "").unwrap();
        fs::write(ctx.layout.root().join("node/1/.emsdk_version"), "node-1").unwrap();
    }

    #[test]
    fn installed_requires_stamp() {
        let (_dir, ctx, reg) = setup();
        let state = State::load(&ctx, &reg);
        let node = reg.find_tool("node-1").unwrap();
        assert!(!state.is_installed(node, false));

        install_node(&ctx);
        assert!(state.is_installed(node, false));

        fs::write(ctx.layout.root().join("node/1/.emsdk_version"), "node-2").unwrap();
        assert!(!state.is_installed(node, false));
        assert!(state.is_installed(node, true));
    }

    #[test]
    fn sdk_installed_through_dependencies() {
        let (_dir, ctx, reg) = setup();
        let state = State::load(&ctx, &reg);
        let sdk = reg.find_sdk("sdk-1").unwrap();
        assert!(!state.is_installed(sdk, false));
        install_node(&ctx);
        assert!(state.is_installed(sdk, false));
    }

    #[test]
    fn active_follows_config() {
        let (_dir, ctx, reg) = setup();
        install_node(&ctx);
        let root = ctx.layout.root_str();
        assert!(State::load(&ctx, &reg).currently_active_tools().is_empty());

        fs::write(ctx.layout.config_path(), "NODE_JS = emsdk_path + '/node/1/bin/node'\n").unwrap();
        let state = State::load(&ctx, &reg);
        let node = reg.find_tool("node-1").unwrap();
        assert!(state.is_active(node));
        assert_eq!(state.currently_active_sdk().map(|s| s.name.as_str()), Some("sdk-1"));
        assert_eq!(state.find_latest_installed_tool("node").map(|t| t.name.as_str()), Some("node-1"));

        let env = EnvSnapshot::from_pairs([
            ("PATH", format!("{root}/node/1/bin:/usr/bin")),
            ("EMSDK_NODE", format!("{root}/node/1/bin/node")),
        ]);
        assert!(state.is_env_active(node, &env));

        let drifted = EnvSnapshot::from_pairs([
            ("PATH", "/usr/bin".to_string()),
            ("EMSDK_NODE", format!("{root}/node/1/bin/node")),
        ]);
        assert!(!state.is_env_active(node, &drifted));
    }
}
