use crate::session::Session;
use anyhow::Result;
use emsdk_core::Reporter;
use emsdk_core::update::update_emsdk;

pub fn update(session: &Session) -> Result<()> {
    update_emsdk(&session.ctx, session.fetcher(), &session.out)?;
    session.out.success("emsdk is up to date");
    Ok(())
}
