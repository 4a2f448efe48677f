use crate::session::Session;
use anyhow::{Result, bail};
use emsdk_core::env::{self, EnvSnapshot, Scope};
use emsdk_core::state::State;
use emsdk_core::{Reporter, config, graph};

const USAGE: &str = "emsdk activate tool/sdk1 [tool/sdk2] [...]";

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivateFlags {
    pub permanent: bool,
    pub system: bool,
    pub global: bool,
}

impl ActivateFlags {
    /// `--global` is the old spelling of `--system`, which implies
    /// `--permanent`.
    fn scope(self) -> Scope {
        if self.system || self.global {
            Scope::System
        } else if self.permanent {
            Scope::User
        } else {
            Scope::Process
        }
    }
}

/// Make the requested items active on top of what is already active, then
/// rewrite the config and report what the shell still needs.
pub fn activate(session: &Session, names: &[String], flags: ActivateFlags) -> Result<()> {
    let out = &session.out;
    if flags.global {
        out.warning("--global is deprecated. Use `--system` to set the environment variables for all users");
    }
    let scope = flags.scope();
    let permanent = scope != Scope::Process;

    let (names, extra_release_tag) = session.resolve(names, true)?;
    let registry = session.registry(extra_release_tag.as_deref())?;
    let ctx = &session.ctx;

    if permanent {
        out.info("Registering active Emscripten environment permanently");
        out.info("");
    }

    let state = State::load(ctx, &registry);
    let mut requested = state.currently_active_tools();
    for name in &names {
        requested.push(registry.lookup(name, &ctx.host)?);
    }
    if requested.is_empty() {
        bail!("No tools/SDKs specified to activate! Usage:\n   {USAGE}");
    }

    let active = graph::process_tool_list(&state, &requested)?;
    if active.is_empty() {
        bail!("No tools/SDKs found to activate! Usage:\n   {USAGE}");
    }
    let tools: Vec<String> = active.iter().filter(|i| !i.is_sdk).map(ToString::to_string).collect();
    out.info(&format!("Setting the following tools as active:\n   {}", tools.join("\n   ")));
    out.info("");

    emsdk_core::interrupt::check()?;
    config::write(&ctx.layout, &config::render(ctx, &active, &config::node_fallback()))?;
    out.success(&format!("The Emscripten configuration file {} has been rewritten", ctx.layout.config_path().display()));

    let snapshot = EnvSnapshot::from_process();
    let path_add = env::required_path(ctx, &active, &snapshot);
    let shell = std::env::var("SHELL").unwrap_or_default();
    for line in config::next_steps(ctx, &path_add, &shell, permanent) {
        out.info(&line);
    }

    if ctx.host.is_windows() {
        if permanent {
            let plan = env::compute_environment(ctx, &active, &snapshot);
            env::persist(&plan, scope, &snapshot)?;
        } else {
            out.warning(
                "The changes made to environment variables only apply to the currently running shell instance. Use the 'emsdk_env.bat' to re-enter this environment later, or if you'd like to register this environment permanently, rerun this command with the option --permanent.",
            );
        }
    } else if permanent {
        out.warning("--permanent and --system only change the environment on Windows; add the source line above to your shell startup script instead");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_implies_permanent() {
        let scope = |permanent, system, global| ActivateFlags { permanent, system, global }.scope();
        assert_eq!(scope(false, false, false), Scope::Process);
        assert_eq!(scope(true, false, false), Scope::User);
        assert_eq!(scope(false, true, false), Scope::System);
        assert_eq!(scope(false, false, true), Scope::System);
    }
}
