//! Everything a command needs: the resolved root, the host, settings, the
//! releases file and the collaborators that touch the outside world.

use crate::ui::Output;
use crate::{BuildArgs, Cli};
use anyhow::{Context as _, Result};
use emsdk_core::cmake::{self, CmakeCli};
use emsdk_core::git::GitCli;
use emsdk_core::install::{Collaborators, Installer};
use emsdk_core::io::HttpFetcher;
use emsdk_core::manifest::{self, TagLists};
use emsdk_core::releases::load_releases_info;
use emsdk_core::resolver::{ReleasesTot, Resolver};
use emsdk_core::{Context, Layout, Registry, Settings, paths};
use emsdk_schema::{Host, ReleasesInfo};
use std::fmt;
use tracing::debug;

pub struct Session {
    pub ctx: Context,
    pub releases: ReleasesInfo,
    pub out: Output,
    fetcher: HttpFetcher,
    vcs: GitCli,
    builder: CmakeCli,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.ctx.layout.root())
            .field("host", &self.ctx.host)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open the emsdk tree named by `--root`/`EMSDK_ROOT`, or the one the
    /// executable lives in.
    pub fn open(cli: &Cli, settings: Settings) -> Result<Self> {
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => paths::default_root().context("Failed to locate the emsdk root directory")?,
        };
        let host = Host::detect()?;
        debug!("emsdk root: {}, host: {host:?}", root.display());
        let layout = Layout::new(root);
        let releases = load_releases_info(&layout)?;
        let vcs = GitCli::new(layout.root(), host.os, settings.shallow);
        let ctx = Context::new(layout, host, settings);
        Ok(Self {
            releases,
            out: Output::new(cli.quiet, cli.notty),
            fetcher: HttpFetcher::new()?,
            vcs,
            builder: CmakeCli::new(ctx.host),
            ctx,
        })
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    /// Map user-facing names onto manifest names, along with the release
    /// hash the manifest has to be expanded with.
    pub fn resolve(&self, names: &[String], activating: bool) -> Result<(Vec<String>, Option<String>)> {
        let tot = ReleasesTot {
            ctx: &self.ctx,
            vcs: &self.vcs,
            fetcher: &self.fetcher,
            reporter: &self.out,
        };
        let resolver = Resolver::new(&self.ctx, &self.releases, &tot, &self.out);
        Ok(resolver.resolve_all(names, activating)?)
    }

    pub fn registry(&self, extra_release_tag: Option<&str>) -> Result<Registry> {
        let doc = manifest::read_manifest(&self.ctx.layout)?;
        let tags = TagLists::load(&self.ctx.layout, &self.releases, extra_release_tag);
        Ok(manifest::load_registry(&doc, &tags, &self.ctx.host)?)
    }

    pub fn installer<'a>(&'a self, registry: &'a Registry) -> Installer<'a> {
        let with = Collaborators {
            fetcher: &self.fetcher,
            vcs: &self.vcs,
            builder: &self.builder,
        };
        Installer::new(&self.ctx, registry, &self.releases, with, &self.out)
    }
}

/// Settings from the environment, overridden by `install` flags.
pub fn settings(build: Option<&BuildArgs>) -> Result<Settings> {
    let mut settings = Settings::from_env();
    let host = Host::detect()?;
    settings.generator = cmake::default_generator(&host);
    let Some(build) = build else {
        return Ok(settings);
    };
    if let Some(jobs) = build.jobs {
        settings.cores = jobs.max(1);
    }
    settings.shallow = build.shallow;
    settings.build_type = build.build_type;
    if let Some(generator) = &build.generator {
        settings.generator.clone_from(generator);
    }
    settings.build_tests = build.build_tests;
    settings.assertions = build.assertions();
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use emsdk_core::{Assertions, BuildType};

    #[test]
    fn install_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "emsdk",
            "install",
            "-j3",
            "--shallow",
            "--build=Debug",
            "--generator=Ninja",
            "--enable-assertions",
            "sdk-main-64bit",
        ])
        .unwrap();
        let crate::Commands::Install { build, .. } = cli.command else {
            panic!("expected install");
        };
        let s = settings(Some(&build)).unwrap();
        assert_eq!(s.cores, 3);
        assert!(s.shallow);
        assert_eq!(s.build_type, Some(BuildType::Debug));
        assert_eq!(s.generator, "Ninja");
        assert_eq!(s.assertions, Assertions::On);
    }
}
