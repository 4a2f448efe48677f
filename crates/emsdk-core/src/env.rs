//! Environment and `PATH` reconciliation for the active items.
//!
//! Everything here works on an [`EnvSnapshot`] instead of the live process
//! environment, so the same computation drives `construct_env`, permanent
//! activation and drift detection.

use crate::config::{emscripten_version_at, find_emscripten_root};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::paths::to_unix_path;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Variables read by emsdk itself; never cleared.
pub const INPUT_VARS: [&str; 11] = [
    "EMSDK_POWERSHELL",
    "EMSDK_CSH",
    "EMSDK_CMD",
    "EMSDK_BASH",
    "EMSDK_FISH",
    "EMSDK_NUM_CORES",
    "EMSDK_NOTTY",
    "EMSDK_KEEP_DOWNLOADS",
    "EMSDK_ROOT",
    "EMSDK_OS",
    "EMSDK_ARCH",
];

/// A copy of the environment the computation runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn path(&self) -> &str {
        self.get("PATH").unwrap_or("")
    }

    /// `PATH` split on the host separator, empty entries dropped.
    pub fn path_entries(&self, sep: char) -> Vec<&str> {
        self.path().split(sep).filter(|e| !e.is_empty()).collect()
    }

    /// Whether `key` is set to `value`, comparing paths separator-agnostic.
    pub fn has_value(&self, key: &str, value: &str) -> bool {
        self.get(key)
            .is_some_and(|v| to_unix_path(v) == to_unix_path(value))
    }
}

/// Whether `entries` contains `elem` once both are normalised to forward
/// slashes.
pub fn normalized_contains<S: AsRef<str>>(entries: &[S], elem: &str) -> bool {
    let elem = to_unix_path(elem);
    entries.iter().any(|e| to_unix_path(e.as_ref()) == elem)
}

/// Directories the active items want on `PATH`, root first.
///
/// An item declaring `activated_path_skip` is left out when that program is
/// already reachable through a directory other than its own.
pub fn required_path(ctx: &Context, active: &[&Item], env: &EnvSnapshot) -> Vec<String> {
    let mut out = vec![ctx.native(&ctx.layout.root().to_string_lossy())];
    for item in active {
        let paths = item.activated_paths(ctx);
        if paths.is_empty() {
            continue;
        }
        if let Some(skip) = &item.def.activated_path_skip {
            if let Some(found) = find_program(skip, env) {
                let dir = found
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if !normalized_contains(&paths, &dir) {
                    debug!("{skip} found at {}, not adding {} to PATH", found.display(), item.name);
                    continue;
                }
            }
        }
        out.extend(paths);
    }
    out
}

fn find_program(program: &str, env: &EnvSnapshot) -> Option<std::path::PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(program, Some(env.path()), cwd).ok()
}

/// `PATH` with the requested directories merged in, plus the directories
/// that were not there before.
///
/// New emsdk entries come first, then the emsdk entries that were already
/// present, then every foreign entry in its original order. Stale emsdk
/// entries are dropped and duplicates collapse to the first occurrence.
pub fn adjusted_path(ctx: &Context, required: &[String], env: &EnvSnapshot) -> (String, Vec<String>) {
    let sep = ctx.host.path_separator();
    let root = ctx.layout.root_str();
    let (managed, foreign): (Vec<&str>, Vec<&str>) = env
        .path_entries(sep)
        .into_iter()
        .partition(|e| to_unix_path(e).starts_with(&root));

    let (kept, new): (Vec<&String>, Vec<&String>) =
        required.iter().partition(|p| normalized_contains(&managed, p));

    let mut seen = HashSet::new();
    let whole: Vec<&str> = new
        .iter()
        .chain(kept.iter())
        .map(|s| s.as_str())
        .chain(foreign)
        .filter(|e| seen.insert(*e))
        .collect();

    (
        whole.join(&sep.to_string()),
        new.into_iter().cloned().collect(),
    )
}

/// The environment changes that make `active` take effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPlan {
    /// Assignments in emission order.
    pub assignments: Vec<(String, String)>,
    /// Variables from previous activations to clear.
    pub unset: Vec<String>,
    /// Directories newly added to `PATH`.
    pub added_path: Vec<String>,
}

impl EnvPlan {
    /// Assignments whose value differs from what `env` already holds.
    pub fn pending<'a>(&'a self, env: &EnvSnapshot) -> Vec<&'a (String, String)> {
        self.assignments
            .iter()
            .filter(|(k, v)| !env.has_value(k, v))
            .collect()
    }

    /// POSIX shell commands applying the plan on top of `env`.
    pub fn render_posix(&self, env: &EnvSnapshot) -> String {
        let mut out = String::new();
        for (key, value) in self.pending(env) {
            out.push_str(&format!("export {key}=\"{value}\";\n"));
        }
        for key in &self.unset {
            out.push_str(&format!("unset {key};\n"));
        }
        out
    }
}

/// Compute the assignments, unsets and `PATH` additions for `active`.
pub fn compute_environment(ctx: &Context, active: &[&Item], env: &EnvSnapshot) -> EnvPlan {
    let mut plan = EnvPlan::default();

    let required = required_path(ctx, active, env);
    let (new_path, added) = adjusted_path(ctx, &required, env);
    if env.get("PATH") != Some(new_path.as_str()) {
        plan.assignments.push(("PATH".to_string(), new_path));
    }
    plan.added_path = added;

    plan.assignments
        .push(("EMSDK".to_string(), ctx.layout.root_str()));

    for item in active {
        for (key, value) in item.activated_environment(ctx) {
            let value = ctx.native(&value);
            plan.assignments.push((key, value));
        }
    }

    // Older emscripten releases do not find their cache and config unaided.
    let emroot = find_emscripten_root(ctx, active);
    let version = emroot.as_deref().and_then(emscripten_version_at);
    if let (Some(emroot), Some(version)) = (emroot, version) {
        if version < vec![1, 39, 16] {
            let cache = Path::new(&emroot).join("cache");
            plan.assignments
                .push(("EM_CACHE".to_string(), ctx.native(&cache.to_string_lossy())));
        }
        if version < vec![1, 39, 13] {
            let config = ctx.layout.config_path();
            plan.assignments
                .push(("EM_CONFIG".to_string(), ctx.native(&config.to_string_lossy())));
        }
    }

    let assigned: HashSet<&str> = plan.assignments.iter().map(|(k, _)| k.as_str()).collect();
    // A bundled python must not see the user's python setup.
    if assigned.contains("EMSDK_PYTHON") {
        plan.unset.extend(["PYTHONHOME".to_string(), "PYTHONPATH".to_string()]);
    }
    let leftovers: Vec<String> = env
        .keys()
        .filter(|k| k.starts_with("EMSDK_") || *k == "EM_CACHE" || *k == "EM_CONFIG")
        .filter(|k| !assigned.contains(k) && !INPUT_VARS.contains(k))
        .map(str::to_string)
        .collect();
    plan.unset.extend(leftovers);

    plan
}

/// Where a permanent activation is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the current shell, through `construct_env`.
    Process,
    /// The user's registry environment.
    User,
    /// The machine-wide registry environment.
    System,
}

/// Write the plan into the Windows registry environment for `scope`.
///
/// Values already present in `env` are skipped; stale variables are deleted.
pub fn persist(plan: &EnvPlan, scope: Scope, env: &EnvSnapshot) -> Result<()> {
    if scope == Scope::Process {
        return Ok(());
    }
    for (key, value) in plan.pending(env) {
        let value = value.replace('%', "^%");
        if value.len() >= 1024 {
            return Err(Error::Unsupported(format!(
                "the new environment variable {key} is more than 1024 characters long! A value this long cannot be set via command line: please add the environment variable specified above to system environment manually via Control Panel."
            )));
        }
        let mut cmd = Command::new("SETX");
        cmd.arg(key).arg(&value);
        if scope == Scope::System {
            cmd.arg("/M");
        }
        run_quiet(&mut cmd, &format!("Failed to set environment variable {key}={value}. You may need to set it manually."))?;
    }
    let hive = match scope {
        Scope::System => "HKLM\\SYSTEM\\CurrentControlSet\\Control\\Session Manager\\Environment",
        _ => "HKCU\\Environment",
    };
    for key in &plan.unset {
        let mut cmd = Command::new("REG");
        cmd.args(["DELETE", hive, "/V", key, "/f"]);
        if let Err(e) = run_quiet(&mut cmd, &format!("failed to delete {key}")) {
            debug!("{e}");
        }
    }
    Ok(())
}

fn run_quiet(cmd: &mut Command, failure: &str) -> Result<()> {
    debug!("{cmd:?}");
    let status = cmd
        .stdout(Stdio::null())
        .status()
        .map_err(|e| Error::MissingProgram(format!("{failure} ({e})")))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Unsupported(failure.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Layout;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Host, Os};

    fn ctx() -> Context {
        Context::new(Layout::new("/e"), Host::new(Os::Linux, Arch::X86_64), Settings::default())
    }

    fn item(json: &str) -> Item {
        Item::new(serde_json::from_str(json).unwrap(), false)
    }

    #[test]
    fn path_merge_order() {
        let ctx = ctx();
        let env = EnvSnapshot::from_pairs([("PATH", "/usr/bin:/e/old/bin:/e/node/bin:/bin:/usr/bin")]);
        let required = vec!["/e".to_string(), "/e/node/bin".to_string(), "/e/up/bin".to_string()];

        let (path, added) = adjusted_path(&ctx, &required, &env);

        assert_eq!(path, "/e:/e/up/bin:/e/node/bin:/usr/bin:/bin");
        assert_eq!(added, vec!["/e", "/e/up/bin"]);
    }

    #[test]
    fn environment_plan() {
        let ctx = ctx();
        let node = item(
            r#"{"id":"node","version":"1","install_path":"node/1","activated_path":"%installation_dir%/bin",
                "activated_env":"EMSDK_NODE=%installation_dir%/bin/node"}"#,
        );
        let env = EnvSnapshot::from_pairs([
            ("PATH", "/usr/bin"),
            ("EMSDK_STALE", "x"),
            ("EM_CACHE", "/old"),
            ("EMSDK_NUM_CORES", "4"),
            ("HOME", "/home/u"),
        ]);

        let plan = compute_environment(&ctx, &[&node], &env);

        assert_eq!(
            plan.assignments,
            vec![
                ("PATH".to_string(), "/e:/e/node/1/bin:/usr/bin".to_string()),
                ("EMSDK".to_string(), "/e".to_string()),
                ("EMSDK_NODE".to_string(), "/e/node/1/bin/node".to_string()),
            ]
        );
        assert_eq!(plan.unset, vec!["EMSDK_STALE", "EM_CACHE"]);

        let script = plan.render_posix(&env);
        assert!(script.contains("export EMSDK=\"/e\";\n"));
        assert!(script.ends_with("unset EMSDK_STALE;\nunset EM_CACHE;\n"));
    }

    #[test]
    fn old_emscripten_gets_one_cache_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let ctx = Context::new(Layout::new(dir.path()), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let emscripten = |name: &str| {
            let emroot = dir.path().join("emscripten").join(name);
            std::fs::create_dir_all(&emroot).unwrap();
            std::fs::write(emroot.join("emscripten-version.txt"), "\"1.38.0\"\n").unwrap();
            item(&format!(
                r#"{{"id":"emscripten","version":"{name}","install_path":"emscripten/{name}",
                    "activated_cfg":"EMSCRIPTEN_ROOT='%installation_dir%'",
                    "activated_env":"EMSDK_{name}=1"}}"#
            ))
        };
        let (a, b) = (emscripten("a"), emscripten("b"));

        let plan = compute_environment(&ctx, &[&a, &b], &EnvSnapshot::from_pairs([("PATH", "/bin")]));

        let tail: Vec<(&str, &str)> = plan.assignments[2..]
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            tail,
            [
                ("EMSDK_a", "1"),
                ("EMSDK_b", "1"),
                ("EM_CACHE", format!("{root}/emscripten/b/cache").as_str()),
                ("EM_CONFIG", format!("{root}/.emscripten").as_str()),
            ]
        );
    }

    #[test]
    fn unchanged_values_are_not_pending() {
        let plan = EnvPlan {
            assignments: vec![("EMSDK".into(), "/e".into()), ("X".into(), "1".into())],
            ..EnvPlan::default()
        };
        let env = EnvSnapshot::from_pairs([("EMSDK", "/e")]);
        let pending = plan.pending(&env);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, "X");
    }

    #[test]
    fn process_scope_persists_nothing() {
        let plan = EnvPlan {
            assignments: vec![("X".into(), "1".into())],
            ..EnvPlan::default()
        };
        assert!(persist(&plan, Scope::Process, &EnvSnapshot::default()).is_ok());
    }
}
