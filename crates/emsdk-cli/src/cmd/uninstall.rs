use crate::session::Session;
use anyhow::{Result, bail};

/// Remove one installed tool. SDKs are not uninstalled as a unit.
pub fn uninstall(session: &Session, name: &str) -> Result<()> {
    let registry = session.registry(None)?;
    let Some(tool) = registry.find_tool(name) else {
        bail!("Tool by name '{name}' was not found.");
    };
    session.installer(&registry).uninstall(tool)?;
    Ok(())
}
