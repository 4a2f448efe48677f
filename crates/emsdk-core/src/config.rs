//! The persisted activation config, `<root>/.emscripten`.
//!
//! The file is a small Python module that emscripten imports. Paths under the
//! root are written relative to `emsdk_path` so the tree can be moved.

use crate::error::{Error, Result};
use crate::fsutil::{move_with_overwrite, rmfile};
use crate::item::{Item, parse_key_value};
use crate::context::Context;
use crate::paths::Layout;
use emsdk_schema::parse_emscripten_version;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const HEADER: &str = "import os\nemsdk_path = os.path.dirname(os.getenv('EM_CONFIG')).replace('\\\\', '/')\n";

/// Key/value view of `.emscripten` as last written.
#[derive(Debug, Clone, Default)]
pub struct EmConfig {
    entries: HashMap<String, String>,
    root: String,
}

impl EmConfig {
    /// Read the config under `layout`; a missing or unreadable file is empty.
    pub fn load(layout: &Layout) -> Self {
        match fs::read_to_string(layout.config_path()) {
            Ok(text) => Self::parse(&text, &layout.root_str()),
            Err(e) => {
                debug!("no config loaded: {e}");
                Self {
                    entries: HashMap::new(),
                    root: layout.root_str(),
                }
            }
        }
    }

    /// Parse config text. `root` is the unix-style emsdk root.
    pub fn parse(text: &str, root: &str) -> Self {
        let entries = text
            .lines()
            .map(parse_key_value)
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self {
            entries,
            root: root.to_string(),
        }
    }

    /// Raw value as written, quotes included.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value with `emsdk_path + '` expanded back to the root and the quotes
    /// removed, comparable to an item's `activated_cfg` entry.
    pub fn normalized(&self, key: &str) -> Option<String> {
        let raw = self.get(key)?;
        let expanded = raw.replace("emsdk_path + '", &format!("'{}", self.root));
        Some(expanded.trim_matches('\'').to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `EMSCRIPTEN_ROOT` of the last item that declares one.
pub fn find_emscripten_root(ctx: &Context, items: &[&Item]) -> Option<String> {
    items
        .iter()
        .filter_map(|item| {
            item.activated_config(ctx)
                .into_iter()
                .find(|(k, _)| k == "EMSCRIPTEN_ROOT")
                .map(|(_, v)| v)
        })
        .next_back()
}

/// Version recorded in `<emroot>/emscripten-version.txt`.
pub fn emscripten_version_at(emroot: &str) -> Option<Vec<u64>> {
    let text = fs::read_to_string(Path::new(emroot).join("emscripten-version.txt")).ok()?;
    parse_emscripten_version(&text)
}

/// `nodejs` as found on `PATH`, else plain `node`.
pub fn node_fallback() -> String {
    which::which("nodejs")
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "node".to_string())
}

/// Text of `.emscripten` for the given active items, in activation order.
pub fn render(ctx: &Context, active: &[&Item], node_fallback: &str) -> String {
    let mut merged: Vec<(String, String)> = Vec::new();
    for item in active {
        for (key, value) in item.activated_config(ctx) {
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }
    }
    if !merged.iter().any(|(k, _)| k == "NODE_JS") {
        merged.push(("NODE_JS".to_string(), node_fallback.to_string()));
    }

    let mut cfg = String::from(HEADER);
    for (key, value) in &merged {
        cfg.push_str(&format!("{key} = '{value}'\n"));
    }

    if let Some(version) = find_emscripten_root(ctx, active).and_then(|r| emscripten_version_at(&r)) {
        if version < vec![1, 38, 46] {
            cfg.push_str("COMPILER_ENGINE = NODE_JS\n");
        }
        if version < vec![1, 38, 48] {
            cfg.push_str("JS_ENGINES = [NODE_JS]\n");
        }
    }

    cfg.replace(&format!("'{}", ctx.layout.root_str()), "emsdk_path + '")
}

/// Replace `.emscripten`, keeping the previous one as `.emscripten.old`, and
/// drop emscripten's sanity cache.
pub fn write(layout: &Layout, text: &str) -> Result<()> {
    let path = layout.config_path();
    if path.exists() {
        let backup = layout.config_backup_path();
        move_with_overwrite(&path, &backup).map_err(|e| Error::io_at(&backup, &e))?;
    }
    fs::write(&path, text).map_err(|e| Error::io_at(&path, &e))?;
    rmfile(&layout.sanity_path())?;
    Ok(())
}

/// Shell files to source, chosen from `$SHELL`: the env script and the
/// startup file it should be added to.
pub fn shell_env_configs(layout: &Layout, shell: &str) -> (String, &'static str) {
    let script = |name: &str| layout.root().join(name).to_string_lossy().into_owned();
    if shell.contains("zsh") {
        (script("emsdk_env.sh"), "$HOME/.zprofile")
    } else if shell.contains("csh") {
        (script("emsdk_env.csh"), "$HOME/.cshrc")
    } else if shell.contains("fish") {
        (script("emsdk_env.fish"), "$HOME/.config/fish/config.fish")
    } else {
        (script("emsdk_env.sh"), "$HOME/.bash_profile")
    }
}

/// Guidance printed after a successful activation.
pub fn next_steps(ctx: &Context, path_add: &[String], shell: &str, permanent: bool) -> Vec<String> {
    let mut out = Vec::new();
    if ctx.host.is_windows() {
        if !permanent {
            out.push("Next steps:".to_string());
            out.push("- Consider running `emsdk activate` with --permanent or --system".to_string());
            out.push("  to have emsdk settings available on startup.".to_string());
        }
        return out;
    }
    let (env_script, startup) = shell_env_configs(&ctx.layout, shell);
    out.push("Next steps:".to_string());
    out.push("- To conveniently access emsdk tools from the command line,".to_string());
    out.push("  consider adding the following directories to your PATH:".to_string());
    out.extend(path_add.iter().map(|p| format!("    {p}")));
    out.push("- This can be done for the current shell by running:".to_string());
    out.push(format!("    source \"{env_script}\""));
    out.push("- Configure emsdk in your shell startup scripts by running:".to_string());
    out.push(format!("    echo 'source \"{env_script}\"' >> {startup}"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Host, Os};
    use tempfile::tempdir;

    fn item(json: &str) -> Item {
        Item::new(serde_json::from_str(json).unwrap(), false)
    }

    #[test]
    fn render_merges_and_relativises() {
        let dir = tempdir().unwrap();
        let ctx = Context::new(Layout::new(dir.path()), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let node = item(
            r#"{"id":"node","version":"1","install_path":"node/1","activated_cfg":"NODE_JS='%installation_dir%/bin/node'"}"#,
        );
        let up_a = item(r#"{"id":"a","version":"1","activated_cfg":"LLVM_ROOT='/opt/a'"}"#);
        let up_b = item(r#"{"id":"b","version":"1","activated_cfg":"LLVM_ROOT='/opt/b'"}"#);

        let text = render(&ctx, &[&node, &up_a, &up_b], "node");

        assert!(text.starts_with("import os\n"));
        assert!(text.contains("NODE_JS = emsdk_path + '/node/1/bin/node'\n"));
        assert!(text.contains("LLVM_ROOT = '/opt/b'\n"));
        assert!(!text.contains("/opt/a"));
        assert!(!text.contains("COMPILER_ENGINE"));
    }

    #[test]
    fn version_file_next_to_emscripten() {
        let dir = tempdir().unwrap();
        let emroot = dir.path().to_string_lossy().into_owned();
        assert_eq!(emscripten_version_at(&emroot), None);
        fs::write(dir.path().join("emscripten-version.txt"), "\"3.1.50-git\"\n").unwrap();
        assert_eq!(emscripten_version_at(&emroot), Some(vec![3, 1, 50]));
    }

    #[test]
    fn node_fallback_used_when_missing() {
        let ctx = Context::new(Layout::new("/e"), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let text = render(&ctx, &[], "/usr/bin/nodejs");
        assert!(text.ends_with("NODE_JS = '/usr/bin/nodejs'\n"));
    }

    #[test]
    fn legacy_engine_keys_for_old_emscripten() {
        let dir = tempdir().unwrap();
        let emroot = dir.path().join("emscripten");
        fs::create_dir_all(&emroot).unwrap();
        fs::write(emroot.join("emscripten-version.txt"), "\"1.38.40\"\n").unwrap();
        let ctx = Context::new(Layout::new("/elsewhere"), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let em = item(&format!(
            r#"{{"id":"emscripten","version":"1.38.40","activated_cfg":"EMSCRIPTEN_ROOT='{}'"}}"#,
            emroot.to_string_lossy().replace('\\', "/")
        ));
        let text = render(&ctx, &[&em], "node");
        assert!(text.contains("COMPILER_ENGINE = NODE_JS\n"));
        assert!(text.contains("JS_ENGINES = [NODE_JS]\n"));
    }

    #[test]
    fn write_rotates_and_parses_back() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path());
        fs::write(layout.sanity_path(), "stale").unwrap();
        write(&layout, "A = 'one'\n").unwrap();
        write(&layout, "A = emsdk_path + '/two'\n").unwrap();

        assert_eq!(fs::read_to_string(layout.config_backup_path()).unwrap(), "A = 'one'\n");
        assert!(!layout.sanity_path().exists());

        let cfg = EmConfig::load(&layout);
        assert_eq!(cfg.get("A"), Some("emsdk_path + '/two'"));
        assert_eq!(cfg.normalized("A"), Some(format!("{}/two", layout.root_str())));
        assert_eq!(cfg.normalized("B"), None);
    }

    #[test]
    fn shell_profile_choice() {
        let layout = Layout::new("/e");
        assert_eq!(shell_env_configs(&layout, "/bin/zsh").1, "$HOME/.zprofile");
        assert!(shell_env_configs(&layout, "/bin/tcsh").0.ends_with("emsdk_env.csh"));
        assert_eq!(shell_env_configs(&layout, "").1, "$HOME/.bash_profile");
    }
}
