//! Shared fixtures: a throwaway emsdk root with a small manifest, and
//! collaborators that never touch the network.

#![allow(dead_code)]

use emsdk_core::cmake::{Builder, CmakeJob};
use emsdk_core::git::Vcs;
use emsdk_core::install::{Collaborators, Installer};
use emsdk_core::io::Fetcher;
use emsdk_core::manifest::{TagLists, load_registry, read_manifest};
use emsdk_core::releases::load_releases_info;
use emsdk_core::{Context, Layout, NullReporter, Registry, Reporter, Result, Settings};
use emsdk_schema::{Arch, Host, Os, ReleasesInfo};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const MANIFEST: &str = r#"{
  "tools": [
    {
      "id": "node",
      "version": "16.20.0",
      "bitness": 64,
      "url": "node-v16.20.0-linux-x64.tar.xz",
      "activated_path": "%installation_dir%/bin",
      "activated_cfg": "NODE_JS='%installation_dir%/bin/node%.exe%'",
      "activated_env": "EMSDK_NODE=%installation_dir%/bin/node%.exe%"
    },
    {
      "id": "releases",
      "version": "%releases-tag%",
      "bitness": 64,
      "url": "https://storage.example/%releases-tag%/wasm-binaries.tar.xz",
      "install_path": "upstream",
      "activated_path": "%installation_dir%/emscripten",
      "activated_cfg": "LLVM_ROOT='%installation_dir%/bin';BINARYEN_ROOT='%installation_dir%';EMSCRIPTEN_ROOT='%installation_dir%/emscripten'",
      "emscripten_releases_hash": "%releases-tag%"
    }
  ],
  "sdks": [
    {
      "version": "releases-%releases-tag%",
      "bitness": 64,
      "uses": ["node-16.20.0-64bit", "releases-%releases-tag%-64bit"]
    }
  ]
}"#;

pub const RELEASES: &str = r#"{
  "aliases": {"latest": "2.0.1"},
  "releases": {"2.0.1": "abc123", "2.0.0": "0ld0ld"}
}"#;

pub struct Fixture {
    pub dir: TempDir,
    pub ctx: Context,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("emsdk_manifest.json"), MANIFEST).unwrap();
        fs::write(dir.path().join("emscripten-releases-tags.json"), RELEASES).unwrap();
        let ctx = Context::new(
            Layout::new(dir.path()),
            Host::new(Os::Linux, Arch::X86_64),
            Settings::default(),
        );
        Self { dir, ctx }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn releases(&self) -> ReleasesInfo {
        load_releases_info(&self.ctx.layout).unwrap()
    }

    pub fn registry(&self, extra_release_tag: Option<&str>) -> Registry {
        let doc = read_manifest(&self.ctx.layout).unwrap();
        let tags = TagLists::load(&self.ctx.layout, &self.releases(), extra_release_tag);
        load_registry(&doc, &tags, &self.ctx.host).unwrap()
    }
}

/// Counts downloads; extraction lays out `bin/` and `emscripten/`.
#[derive(Default)]
pub struct CountingFetcher {
    pub downloads: AtomicUsize,
}

impl CountingFetcher {
    pub fn count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl Fetcher for CountingFetcher {
    fn download(&self, _url: &str, target: &Path, _: &dyn Reporter) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, "archive").unwrap();
        Ok(())
    }

    fn exists(&self, _url: &str) -> bool {
        true
    }

    fn extract(&self, _archive: &Path, dest: &Path) -> Result<()> {
        for sub in ["bin", "emscripten"] {
            fs::create_dir_all(dest.join(sub)).unwrap();
        }
        fs::write(dest.join("bin/node"), "").unwrap();
        Ok(())
    }
}

pub struct NoVcs;

impl Vcs for NoVcs {
    fn clone_or_pull(&self, url: &str, _: &Path, _: &str, _: &dyn Reporter) -> Result<()> {
        panic!("unexpected clone of {url}")
    }

    fn recent_commits(&self, _: &Path, _: usize) -> Vec<String> {
        Vec::new()
    }
}

pub struct NoBuilder;

impl Builder for NoBuilder {
    fn configure(&self, _: &CmakeJob, _: &dyn Reporter) -> Result<()> {
        panic!("unexpected configure")
    }

    fn build(&self, _: &CmakeJob, _: &dyn Reporter) -> Result<()> {
        panic!("unexpected build")
    }
}

pub fn installer<'a>(
    fx: &'a Fixture,
    registry: &'a Registry,
    releases: &'a ReleasesInfo,
    fetcher: &'a CountingFetcher,
) -> Installer<'a> {
    let with = Collaborators {
        fetcher,
        vcs: &NoVcs,
        builder: &NoBuilder,
    };
    Installer::new(&fx.ctx, registry, releases, with, &NullReporter)
}
