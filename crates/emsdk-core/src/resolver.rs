//! Maps what the user typed (`latest`, `tot`, `3.1.50`, a hash) to the
//! registry name to operate on.
//!
//! Resolution runs before the registry is built: tip-of-tree and raw-hash
//! requests register an extra release tag that manifest expansion needs in
//! order to create the matching items.

use crate::Reporter;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::git::Vcs;
use crate::interrupt;
use crate::io::Fetcher;
use crate::releases::installed_sdk_version;
use emsdk_schema::{Arch, Os, ReleasesInfo};
use tracing::debug;

/// How many recent releases-repo commits are checked for a build.
const TOT_CANDIDATES: usize = 20;

const FASTCOMP_REMOVED: &str = "the fastcomp backend is no longer supported.  Please use an older version of emsdk (for example 3.1.29) if you want to install the old fastcomp-based SDK";

/// Source of the tip-of-tree build hash.
pub trait TotSource {
    /// Hash of the newest emscripten-releases commit that has a build.
    fn latest_build(&self) -> Result<String>;
}

/// Finds tip-of-tree by walking the releases repository history and probing
/// the build bucket.
pub struct ReleasesTot<'a> {
    pub ctx: &'a Context,
    pub vcs: &'a dyn Vcs,
    pub fetcher: &'a dyn Fetcher,
    pub reporter: &'a dyn Reporter,
}

impl ReleasesTot<'_> {
    fn build_url(&self, hash: &str, ext: &str) -> String {
        let arch = if self.ctx.host.arch == Arch::Arm64 { "-arm64" } else { "" };
        format!(
            "{}{}/{hash}/wasm-binaries{arch}.{ext}",
            self.ctx.settings.releases_builds_url,
            self.ctx.host.os.as_str()
        )
    }

    fn has_build(&self, hash: &str) -> bool {
        if self.ctx.host.os == Os::Windows {
            return self.fetcher.exists(&self.build_url(hash, "zip"));
        }
        self.fetcher.exists(&self.build_url(hash, "tar.xz"))
            || self.fetcher.exists(&self.build_url(hash, "tbz2"))
    }
}

impl TotSource for ReleasesTot<'_> {
    fn latest_build(&self) -> Result<String> {
        debug!("Fetching emscripten-releases repository...");
        let repo = self.ctx.layout.releases_repo_dir();
        self.vcs
            .clone_or_pull(crate::RELEASES_REPO_URL, &repo, "main", self.reporter)?;
        for hash in self.vcs.recent_commits(&repo, TOT_CANDIDATES) {
            interrupt::check()?;
            if self.has_build(&hash) {
                return Ok(hash);
            }
        }
        Err(Error::Download {
            url: self.ctx.settings.releases_builds_url.clone(),
            reason: "failed to find build of any recent emsdk revision".to_string(),
        })
    }
}

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    /// Release hash the manifest must be expanded with for `name` to exist.
    pub extra_release_tag: Option<String>,
}

impl Resolution {
    fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra_release_tag: None,
        }
    }
}

pub struct Resolver<'a> {
    ctx: &'a Context,
    releases: &'a ReleasesInfo,
    tot: &'a dyn TotSource,
    reporter: &'a dyn Reporter,
}

impl<'a> Resolver<'a> {
    pub fn new(
        ctx: &'a Context,
        releases: &'a ReleasesInfo,
        tot: &'a dyn TotSource,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ctx,
            releases,
            tot,
            reporter,
        }
    }

    /// Resolve one request. `activating` reuses an installed tip-of-tree
    /// build instead of looking for a newer one.
    pub fn resolve(&self, requested: &str, activating: bool) -> Result<Resolution> {
        let mut name = requested.to_string();
        if name.contains("upstream-master") {
            self.reporter
                .warning("upstream-master SDK has been renamed main");
            name = name.replace("upstream-master", "main");
        }
        if name.contains("fastcomp") {
            return Err(Error::Deprecated(FASTCOMP_REMOVED.to_string()));
        }

        if matches!(name.as_str(), "tot" | "sdk-tot" | "tot-upstream") {
            if activating {
                if let Some(installed) = installed_sdk_version(&self.ctx.layout) {
                    debug!("activating currently installed SDK; not updating tot version");
                    return Ok(Resolution::plain(format!("sdk-releases-{installed}-64bit")));
                }
            }
            let hash = self.tot.latest_build()?;
            return Ok(Resolution {
                name: format!("sdk-releases-{hash}-64bit"),
                extra_release_tag: Some(hash),
            });
        }

        let name = name.replace("-upstream", "");
        let name = self.resolve_alias(&name);

        let version = ["sdk-", "releases-", "-64bit", "tag-"]
            .iter()
            .fold(name.clone(), |v, token| v.replace(token, ""));
        let sdk = if name.starts_with("releases-") { "" } else { "sdk-" };

        if let Some(hash) = self.releases.release_hash(&version) {
            let full = format!("{sdk}releases-{hash}-64bit");
            self.reporter
                .info(&format!("Resolving SDK version '{version}' to '{full}'"));
            return Ok(Resolution::plain(full));
        }
        if version.len() == 40 {
            return Ok(Resolution {
                name: format!("{sdk}releases-{version}-64bit"),
                extra_release_tag: Some(version),
            });
        }
        Ok(Resolution::plain(name))
    }

    /// Resolve a batch; the last registered release tag wins.
    pub fn resolve_all(&self, requested: &[String], activating: bool) -> Result<(Vec<String>, Option<String>)> {
        let mut names = Vec::with_capacity(requested.len());
        let mut extra = None;
        for r in requested {
            let res = self.resolve(r, activating)?;
            if res.extra_release_tag.is_some() {
                extra = res.extra_release_tag;
            }
            names.push(res.name);
        }
        Ok((names, extra))
    }

    fn resolve_alias(&self, name: &str) -> String {
        let resolved = self.releases.resolve_alias(name);
        if resolved != name {
            self.reporter
                .info(&format!("Resolving SDK alias '{name}' to '{resolved}'"));
        }
        resolved
    }
}
