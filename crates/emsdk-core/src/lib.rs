//! Core library for emsdk.
//!
//! Loads the tool/SDK manifest into a [`Registry`], resolves user-facing
//! names, expands dependency lists, drives installs through pluggable
//! collaborators, and reconciles the activated environment.

pub mod cmake;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod fsutil;
pub mod git;
pub mod graph;
pub mod hooks;
pub mod install;
pub mod interrupt;
pub mod io;
pub mod item;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod releases;
pub mod reporter;
pub mod resolver;
pub mod settings;
pub mod state;
pub mod update;

pub use context::Context;
pub use error::{Error, Result};
pub use item::Item;
pub use paths::*;
pub use registry::{Registry, RepositoryOverride};
pub use reporter::{NullReporter, Reporter};
pub use settings::{Assertions, BuildType, Settings};

/// User Agent string for network requests
pub const USER_AGENT: &str = concat!("emsdk/", env!("CARGO_PKG_VERSION"));

/// Base URL that relative archive names in the manifest are joined to.
pub const PACKAGES_URL: &str =
    "https://storage.googleapis.com/webassembly/emscripten-releases-builds/deps/";

/// Base URL of per-commit emscripten-releases builds.
pub const RELEASES_BUILDS_URL: &str =
    "https://storage.googleapis.com/webassembly/emscripten-releases-builds/";

/// Git repository whose history lists emscripten-releases builds.
pub const RELEASES_REPO_URL: &str = "https://chromium.googlesource.com/emscripten-releases";

/// Archive of the emsdk tree itself, used by `update`.
pub const EMSDK_ZIP_URL: &str = "https://github.com/emscripten-core/emsdk/archive/HEAD.zip";

/// URL suffixes recognised as archives.
pub const ARCHIVE_SUFFIXES: [&str; 6] = ["zip", ".tar", ".gz", ".xz", ".tbz2", ".bz2"];

/// Whether `url` names something the archive fetcher can handle.
pub fn is_archive_url(url: &str) -> bool {
    ARCHIVE_SUFFIXES.iter().any(|s| url.ends_with(s))
}
