//! Self-update of the emsdk tree from the published archive.

use crate::Reporter;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::io::{self, Fetcher};

/// Download the emsdk archive and unpack it over the root, leaving installed
/// tools in place. A git checkout is never touched.
pub fn update_emsdk(ctx: &Context, fetcher: &dyn Fetcher, reporter: &dyn Reporter) -> Result<()> {
    if ctx.layout.is_git_checkout() {
        return Err(Error::Unsupported(
            "You seem to have bootstrapped Emscripten SDK by cloning from GitHub. In this case, use \"git pull\" instead of \"emsdk update\" to update emsdk. (Not doing that automatically in case you have local changes)".to_string(),
        ));
    }
    reporter.section("Updating emsdk");
    io::download_and_extract(
        ctx,
        fetcher,
        reporter,
        crate::EMSDK_ZIP_URL,
        ctx.layout.root(),
        "",
        false,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::paths::Layout;
    use crate::settings::Settings;
    use emsdk_schema::{Arch, Host, Os};
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct Recorder {
        extracted_into: RefCell<Option<PathBuf>>,
    }

    impl Fetcher for Recorder {
        fn download(&self, url: &str, target: &Path, _: &dyn Reporter) -> Result<()> {
            assert_eq!(url, crate::EMSDK_ZIP_URL);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, "zip").unwrap();
            Ok(())
        }

        fn exists(&self, _: &str) -> bool {
            true
        }

        fn extract(&self, _: &Path, dest: &Path) -> Result<()> {
            *self.extracted_into.borrow_mut() = Some(dest.to_path_buf());
            Ok(())
        }
    }

    fn ctx(root: &Path) -> Context {
        Context::new(Layout::new(root), Host::new(Os::Linux, Arch::X86_64), Settings::default())
    }

    #[test]
    fn git_checkout_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let fetcher = Recorder::default();
        let err = update_emsdk(&ctx(dir.path()), &fetcher, &NullReporter).unwrap_err();
        assert!(err.to_string().contains("git pull"));
        assert!(fetcher.extracted_into.borrow().is_none());
    }

    #[test]
    fn archive_is_unpacked_over_the_root_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node/1")).unwrap();
        let fetcher = Recorder::default();
        update_emsdk(&ctx(dir.path()), &fetcher, &NullReporter).unwrap();
        assert_eq!(fetcher.extracted_into.borrow().as_deref(), Some(dir.path()));
        assert!(dir.path().join("node/1").is_dir());
    }
}
