use crate::session::Session;
use anyhow::Result;
use emsdk_core::env::{self, EnvSnapshot};
use emsdk_core::state::State;
use emsdk_core::{Reporter, graph};

/// Print shell code that brings the current shell in line with the active
/// tools. Only the shell code goes to stdout.
pub fn construct_env(session: &Session) -> Result<()> {
    let registry = session.registry(None)?;
    let ctx = &session.ctx;
    let state = State::load(ctx, &registry);
    let active = graph::process_tool_list(&state, &state.currently_active_tools())?;

    let out = &session.out;
    out.info("Setting up EMSDK environment (suppress these messages with EMSDK_QUIET=1)");
    let snapshot = EnvSnapshot::from_process();
    let plan = env::compute_environment(ctx, &active, &snapshot);

    if !plan.added_path.is_empty() {
        out.info("Adding directories to PATH:");
        for dir in &plan.added_path {
            out.info(&format!("PATH += {dir}"));
        }
        out.info("");
    }
    let pending = plan.pending(&snapshot);
    if pending.iter().any(|(k, _)| k != "PATH") {
        out.info("Setting environment variables:");
        for (key, value) in pending.iter().filter(|(k, _)| k != "PATH") {
            out.info(&format!("{key} = {value}"));
        }
    }
    for key in &plan.unset {
        out.info(&format!("Clearing existing environment variable: {key}"));
    }

    print!("{}", plan.render_posix(&snapshot));
    Ok(())
}
