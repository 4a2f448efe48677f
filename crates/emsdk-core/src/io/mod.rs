//! IO modules - side effects (network, filesystem)

pub mod download;
pub mod extract;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Reporter;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fsutil::remove_tree;
use crate::paths::filename_from_url;

pub use download::HttpFetcher;

/// Archive fetch-and-extract collaborator.
pub trait Fetcher {
    /// Fetch `url` into `target`. A partial file is removed on failure.
    fn download(&self, url: &str, target: &Path, reporter: &dyn Reporter) -> Result<()>;

    /// Whether `url` can be fetched.
    fn exists(&self, url: &str) -> bool;

    /// Unpack `archive` into `dest`, stripping one wrapping directory.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        extract::extract_archive(archive, dest)
    }
}

/// `archive` joined to the packages base URL unless it is already absolute.
pub fn resolve_url(ctx: &Context, archive: &str) -> String {
    if archive.contains("://") {
        archive.to_string()
    } else {
        format!("{}{archive}", ctx.settings.packages_url)
    }
}

/// Where `url` is downloaded to: `<root>/downloads/<prefix><filename>`.
pub fn download_target(ctx: &Context, url: &str, prefix: &str) -> PathBuf {
    ctx.layout
        .downloads_dir()
        .join(format!("{prefix}{}", filename_from_url(url)))
}

/// Fetch `archive` and unpack it into `dest`; returns the downloaded file.
///
/// An already downloaded file is reused only when downloads are kept.
/// `wasm-binaries` `.tar.xz` archives fall back to `.tbz2`. With `clobber`
/// the destination is emptied before unpacking.
pub fn download_and_extract(
    ctx: &Context,
    fetcher: &dyn Fetcher,
    reporter: &dyn Reporter,
    archive: &str,
    dest: &Path,
    prefix: &str,
    clobber: bool,
) -> Result<PathBuf> {
    debug!("download_and_extract(archive={archive}, dest_dir={})", dest.display());
    let mut url = resolve_url(ctx, archive);

    let fetch = |url: &str| -> Result<PathBuf> {
        let target = download_target(ctx, url, prefix);
        if ctx.settings.keep_downloads && target.exists() {
            reporter.info(&format!("File '{}' already downloaded, skipping.", target.display()));
        } else {
            fetcher.download(url, &target, reporter)?;
        }
        Ok(target)
    };

    let target = if archive.contains("wasm-binaries") && archive.ends_with(".xz") {
        match fetch(&url) {
            Ok(t) => t,
            Err(Error::Interrupted) => return Err(Error::Interrupted),
            Err(e) => {
                debug!("{e}; trying .tbz2");
                let alt = url.replace(".tar.xz", ".tbz2");
                let t = fetch(&alt)?;
                url = alt;
                t
            }
        }
    } else {
        fetch(&url)?
    };

    if clobber {
        remove_tree(dest);
    }
    reporter.extracting(filename_from_url(&url), &dest.to_string_lossy());
    fetcher.extract(&target, dest)?;
    Ok(target)
}
