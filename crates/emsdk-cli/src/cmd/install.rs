use crate::BuildArgs;
use crate::session::Session;
use anyhow::Result;
use emsdk_core::Reporter;
use emsdk_schema::{Arch, Os};

/// Install each requested tool or SDK, resolving aliases first.
pub fn install(session: &Session, names: &[String], build: &BuildArgs) -> Result<()> {
    let host = session.ctx.host;
    if host.os == Os::Linux && host.arch == Arch::Arm64 && names != ["latest"] {
        session.out.warning(
            "arm64-linux binaries are not available for all releases. See https://github.com/emscripten-core/emsdk/issues/547",
        );
    }

    let (names, extra_release_tag) = session.resolve(names, false)?;
    let mut registry = session.registry(extra_release_tag.as_deref())?;
    for ov in &build.override_repository {
        registry.apply_override(ov)?;
    }

    let installer = session.installer(&registry);
    for name in &names {
        let item = registry.lookup(name, &host)?;
        installer.install(item)?;
    }
    Ok(())
}
