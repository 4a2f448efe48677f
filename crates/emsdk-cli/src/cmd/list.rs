use crate::session::Session;
use crate::ui::list::{Marker, item_row, release_row, sdk_row, uses_row};
use anyhow::Result;
use emsdk_core::env::EnvSnapshot;
use emsdk_core::state::State;
use emsdk_core::{Item, Registry};
use emsdk_schema::Arch;

/// List the release versions, SDKs and tools with their status.
pub fn list(session: &Session, old: bool, uses: bool) -> Result<()> {
    let registry = session.registry(None)?;
    let env = EnvSnapshot::from_process();
    for line in render(session, &registry, &env, old, uses) {
        println!("{line}");
    }
    Ok(())
}

pub fn render(session: &Session, registry: &Registry, env: &EnvSnapshot, old: bool, uses: bool) -> Vec<String> {
    let ctx = &session.ctx;
    let theme = &session.out.theme;
    let state = State::load(ctx, registry);
    let sdk_installed = |hash: &str| {
        registry
            .find_sdk(&format!("sdk-releases-{hash}-64bit"))
            .is_some_and(|sdk| state.is_installed(sdk, false))
    };

    let mut out = vec![String::new()];
    if matches!(ctx.host.arch, Arch::X86 | Arch::X86_64) {
        let version = session.releases.latest_version();
        let hash = session.releases.latest_hash().unwrap_or_default();
        out.push(format!("The *recommended* precompiled SDK download is {version} ({hash})."));
        out.push(String::new());
        out.push("To install/activate it use:".to_string());
        out.push("         latest".to_string());
        out.push(String::new());
        out.push("This is equivalent to installing/activating:".to_string());
        out.push(release_row(&version, sdk_installed(hash)));
        out.push(String::new());
    } else {
        out.push("Warning: your platform does not have precompiled SDKs available.".to_string());
        out.push("You may install components from source.".to_string());
        out.push(String::new());
    }

    out.push("All recent (non-legacy) installable versions are:".to_string());
    for version in session.releases.versions_sorted_desc() {
        let installed = session.releases.release_hash(version).is_some_and(sdk_installed);
        out.push(release_row(version, installed));
    }
    out.push(String::new());

    let shown = |sdks: bool, compiled: bool| {
        let items = if sdks { registry.sdks() } else { registry.tools() };
        items
            .iter()
            .filter(|i| old || !i.def.is_old)
            .filter(|i| registry.needs_compilation(i) == compiled)
            .collect::<Vec<_>>()
    };

    if !registry.sdks().is_empty() {
        let sdk_section = |out: &mut Vec<String>, sdks: Vec<&Item>| {
            for sdk in sdks {
                out.push(sdk_row(theme, state.is_active(sdk), sdk.name.as_str(), state.is_installed(sdk, false)));
                if uses {
                    out.extend(sdk.def.uses.iter().map(|dep| uses_row(theme, dep)));
                }
            }
            out.push(String::new());
        };
        out.push("The additional following precompiled SDKs are also available for download:".to_string());
        sdk_section(&mut out, shown(true, false));
        out.push("The following SDKs can be compiled from source:".to_string());
        sdk_section(&mut out, shown(true, true));
    }

    let mut partially_active = false;
    if registry.tools().is_empty() {
        out.push(format!(
            "There are no tools available. Run '{}' to fetch the latest set of tools.",
            update_hint(session)
        ));
        out.push(String::new());
    } else {
        let mut tool_section = |out: &mut Vec<String>, tools: Vec<&Item>| {
            for tool in tools {
                let status = match tool.can_be_installed(&ctx.host) {
                    Ok(()) if state.is_installed(tool, false) => "INSTALLED".to_string(),
                    Ok(()) => String::new(),
                    Err(reason) => format!("Not available: {reason}"),
                };
                let active = state.is_active(tool);
                let marker = if active && state.is_env_active(tool, env) {
                    Marker::Active
                } else if active {
                    partially_active = true;
                    Marker::Selected
                } else {
                    Marker::Inactive
                };
                out.push(item_row(theme, marker, tool.name.as_str(), &status));
            }
            out.push(String::new());
        };
        out.push("The following precompiled tool packages are available for download:".to_string());
        tool_section(&mut out, shown(false, false));
        out.push("The following tools can be compiled from source:".to_string());
        tool_section(&mut out, shown(false, true));
    }

    out.push("Items marked with * are activated for the current user.".to_string());
    if partially_active {
        let (env_cmd, tail) = if ctx.host.is_windows() {
            (
                "emsdk_env.bat",
                ", or call \"emsdk activate --permanent <name_of_sdk>\" to permanently activate them.",
            )
        } else {
            ("source ./emsdk_env.sh", ".")
        };
        out.push(format!(
            "Items marked with (*) are selected for use, but your current shell environment is not configured to use them. Type \"{env_cmd}\" to set up your current shell to use them{tail}"
        ));
    }
    if !old {
        out.push(String::new());
        out.push("To access the historical archived versions, type 'emsdk list --old'".to_string());
    }
    out.push(String::new());
    if session.ctx.layout.is_git_checkout() {
        out.push("Run \"git pull\" to pull in the latest list.".to_string());
    } else {
        out.push("Run \"./emsdk update\" to pull in the latest list.".to_string());
    }
    out
}

fn update_hint(session: &Session) -> &'static str {
    if session.ctx.layout.is_git_checkout() {
        "git pull"
    } else {
        "emsdk update"
    }
}
