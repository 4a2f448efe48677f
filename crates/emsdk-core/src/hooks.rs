//! Post-install step for emscripten trees: `npm ci` plus its bootstrap.

use crate::Reporter;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::state::State;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const HOOK: &str = "emscripten_npm_install";

/// Directory holding `npm`: the newest installed node, else whatever `npm`
/// is on `PATH`.
pub fn node_bin_dir(state: &State<'_>) -> Option<PathBuf> {
    if let Some(node) = state.find_latest_installed_tool("node") {
        return Some(node.installation_path(state.ctx).join("bin"));
    }
    which::which("npm")
        .ok()
        .and_then(|npm| npm.parent().map(Path::to_path_buf))
}

/// Run `npm ci --production` in `directory`, then `bootstrap.py` when the
/// tree ships one.
pub fn emscripten_npm_install(
    ctx: &Context,
    node_dir: Option<&Path>,
    directory: &Path,
    reporter: &dyn Reporter,
) -> Result<()> {
    let node_dir = node_dir.ok_or_else(|| Error::Hook {
        hook: HOOK,
        reason: format!(
            "Failed to find npm command! Running \"npm ci\" in installed Emscripten root directory {} is required! Please install node.js first!",
            directory.display()
        ),
    })?;

    let npm = node_dir.join(if ctx.host.is_windows() { "npm.cmd" } else { "npm" });
    let path = std::env::var_os("PATH").unwrap_or_default();
    let path = std::env::join_paths(std::iter::once(node_dir.to_path_buf()).chain(std::env::split_paths(&path)))
        .map_err(|e| Error::Hook {
            hook: HOOK,
            reason: e.to_string(),
        })?;

    reporter.info("Running post-install step: npm ci ...");
    run_step(Command::new(&npm).args(["ci", "--production"]), directory, &path)?;
    reporter.info("Done running: npm ci");

    let bootstrap = directory.join("bootstrap.py");
    if bootstrap.is_file() {
        let python = which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|_| Error::Hook {
                hook: HOOK,
                reason: "python is required to run bootstrap.py".to_string(),
            })?;
        run_step(Command::new(python).arg(&bootstrap), directory, &path)?;
        reporter.info("Done running: Emscripten bootstrap");
    }
    Ok(())
}

fn run_step(cmd: &mut Command, cwd: &Path, path: &std::ffi::OsStr) -> Result<()> {
    debug!("{cmd:?} in {}", cwd.display());
    let output = cmd
        .current_dir(cwd)
        .env("PATH", path)
        .output()
        .map_err(|e| Error::Hook {
            hook: HOOK,
            reason: format!("Error running {cmd:?}: {e}"),
        })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::Hook {
            hook: HOOK,
            reason: format!(
                "Error running {cmd:?}:\n{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::paths::Layout;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Host, Os};

    #[test]
    fn missing_npm_is_a_hook_error() {
        let ctx = Context::new(Layout::new("/e"), Host::new(Os::Linux, Arch::X86_64), Settings::default());
        let err = emscripten_npm_install(&ctx, None, Path::new("/e/upstream/emscripten"), &NullReporter).unwrap_err();
        assert!(matches!(err, Error::Hook { hook: "emscripten_npm_install", .. }));
        assert!(err.to_string().contains("Please install node.js first!"));
    }
}
