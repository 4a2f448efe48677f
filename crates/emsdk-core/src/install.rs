//! Install and uninstall of tools and SDKs.
//!
//! An item moves `not installed -> installing -> installed -> uninstalling ->
//! not installed`. "Installed" is never stored; it is re-derived from the
//! tree and its `.emsdk_version` stamp (see [`State::is_installed`]).

use crate::Reporter;
use crate::cmake::{self, Builder, Toolchain};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fsutil::{remove_tree, rmfile};
use crate::git::Vcs;
use crate::hooks;
use crate::interrupt;
use crate::io::{self, Fetcher};
use crate::item::Item;
use crate::registry::Registry;
use crate::state::State;
use emsdk_schema::{InstallHook, ReleasesInfo, UninstallHook};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Something was fetched, built or updated.
    Installed,
    /// Nothing needed doing.
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed,
    NotInstalled,
}

/// The side-effecting collaborators an install needs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub vcs: &'a dyn Vcs,
    pub builder: &'a dyn Builder,
}

pub struct Installer<'a> {
    ctx: &'a Context,
    registry: &'a Registry,
    releases: &'a ReleasesInfo,
    with: Collaborators<'a>,
    reporter: &'a dyn Reporter,
}

impl<'a> Installer<'a> {
    pub fn new(
        ctx: &'a Context,
        registry: &'a Registry,
        releases: &'a ReleasesInfo,
        with: Collaborators<'a>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ctx,
            registry,
            releases,
            with,
            reporter,
        }
    }

    fn state(&self) -> State<'a> {
        State::load(self.ctx, self.registry)
    }

    fn toolchain(&self) -> Toolchain<'a> {
        Toolchain {
            vcs: self.with.vcs,
            builder: self.with.builder,
            reporter: self.reporter,
        }
    }

    /// Install a tool or an SDK with all its components.
    pub fn install(&self, item: &Item) -> Result<InstallOutcome> {
        if let Err(reason) = item.can_be_installed(&self.ctx.host) {
            return Err(Error::Unsupported(format!(
                "The tool '{item}' is not available due to the reason: {reason}"
            )));
        }
        if item.is_sdk {
            self.install_sdk(item)
        } else {
            self.install_tool(item)
        }
    }

    fn install_sdk(&self, sdk: &Item) -> Result<InstallOutcome> {
        self.reporter.section(&format!("Installing SDK '{sdk}'.."));
        let mut installed = false;
        for name in &sdk.def.uses {
            let tool = self.registry.find_tool(name).ok_or_else(|| {
                Error::Internal(format!(
                    "manifest error: No tool by name '{name}' found! This may indicate an internal SDK error!"
                ))
            })?;
            installed |= self.install(tool)? == InstallOutcome::Installed;
        }

        if !installed {
            self.reporter
                .skipped(&sdk.name, "All SDK components already installed");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        if sdk.def.custom_install_script == Some(InstallHook::EmscriptenNpmInstall) {
            let emscripten_dir = self.ctx.layout.upstream_emscripten_dir();
            if !emscripten_dir.join("node_modules").exists() {
                let node_dir = hooks::node_bin_dir(&self.state());
                hooks::emscripten_npm_install(self.ctx, node_dir.as_deref(), &emscripten_dir, self.reporter)?;
            }
        }
        self.reporter.done(&sdk.name, "installed");
        Ok(InstallOutcome::Installed)
    }

    fn install_tool(&self, tool: &Item) -> Result<InstallOutcome> {
        interrupt::check()?;
        if !tool.is_git_tracked() && self.state().is_installed(tool, false) {
            self.reporter.skipped(&tool.name, "already installed");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        self.reporter.installing(&tool.name);
        let downloaded = self.fetch(tool)?;
        self.post_install(tool)?;
        self.write_emscripten_version(tool)?;

        if !self.state().is_installed(tool, true) {
            return Err(Error::Internal(format!(
                "installation of '{tool}' failed, but no error was detected. Either something went wrong with the installation, or this may indicate an internal emsdk error."
            )));
        }

        if let Some(archive) = downloaded {
            if !self.ctx.settings.keep_downloads {
                debug!("Deleting temporary download: {}", archive.display());
                rmfile(&archive)?;
            }
        }
        let stamp = tool.version_file_path(self.ctx);
        fs::write(&stamp, format!("{}\n", tool.name)).map_err(|e| Error::io_at(&stamp, &e))?;
        self.reporter.done(&tool.name, "installed");
        Ok(InstallOutcome::Installed)
    }

    /// Run the one fetch step that applies; returns the downloaded archive,
    /// if any.
    fn fetch(&self, tool: &Item) -> Result<Option<PathBuf>> {
        if let Some(hook) = tool.def.custom_install_script.filter(|h| h.replaces_fetch()) {
            self.build_from_source(hook, tool)?;
            return Ok(None);
        }
        let url = tool.download_url(&self.ctx.host).ok_or_else(|| {
            Error::Internal(format!("'{tool}' has nothing to install on this host"))
        })?;
        if let Some(branch) = &tool.def.git_branch {
            self.with
                .vcs
                .clone_or_pull(url, &tool.installation_path(self.ctx), branch, self.reporter)?;
            return Ok(None);
        }
        if crate::is_archive_url(url) {
            let prefix = tool.def.download_prefix.as_deref().unwrap_or("");
            let archive = io::download_and_extract(
                self.ctx,
                self.with.fetcher,
                self.reporter,
                url,
                &tool.installation_path(self.ctx),
                prefix,
                true,
            )?;
            return Ok(Some(archive));
        }
        Err(Error::Internal(format!("unhandled url type: {url}")))
    }

    fn post_install(&self, tool: &Item) -> Result<()> {
        match tool.def.custom_install_script {
            Some(InstallHook::EmscriptenNpmInstall) => {
                let node_dir = hooks::node_bin_dir(&self.state());
                hooks::emscripten_npm_install(
                    self.ctx,
                    node_dir.as_deref(),
                    &tool.installation_path(self.ctx),
                    self.reporter,
                )
            }
            Some(InstallHook::BuildBinaryen) => cmake::build_binaryen(self.ctx, tool, &self.toolchain()),
            // Source builds already ran in place of the fetch.
            Some(_) | None => Ok(()),
        }
    }

    fn build_from_source(&self, hook: InstallHook, tool: &Item) -> Result<()> {
        let tc = self.toolchain();
        match hook {
            InstallHook::BuildLlvm => cmake::build_llvm(self.ctx, tool, &tc),
            InstallHook::BuildNinja => cmake::build_ninja(self.ctx, tool, &tc),
            InstallHook::BuildCcache => cmake::build_ccache(self.ctx, tool, &tc),
            InstallHook::BuildBinaryen | InstallHook::EmscriptenNpmInstall => Err(Error::Internal(format!(
                "'{tool}': {hook:?} does not replace the fetch step"
            ))),
        }
    }

    /// Record the release version next to a release build's binaries.
    fn write_emscripten_version(&self, tool: &Item) -> Result<()> {
        let Some(hash) = &tool.def.emscripten_releases_hash else {
            return Ok(());
        };
        let Some(version) = self.releases.version_for_hash(hash) else {
            return Ok(());
        };
        let Some(dir) = tool.activated_paths(self.ctx).into_iter().next() else {
            return Ok(());
        };
        let path = PathBuf::from(dir).join("emscripten-version.txt");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, &e))?;
        }
        fs::write(&path, format!("\"{version}\"\n")).map_err(|e| Error::io_at(&path, &e))
    }

    /// Remove an installed tool's tree. Removal is best effort.
    pub fn uninstall(&self, tool: &Item) -> Result<UninstallOutcome> {
        if !self.state().is_installed(tool, false) {
            self.reporter
                .skipped(&tool.name, "was not installed. No need to uninstall");
            return Ok(UninstallOutcome::NotInstalled);
        }
        self.reporter.removing(&tool.name);
        if let Some(UninstallHook::UninstallBinaryen) = tool.def.custom_uninstall_script {
            cmake::uninstall_binaryen(self.ctx, tool, self.reporter);
        }
        let path = tool.installation_path(self.ctx);
        self.reporter
            .info(&format!("Deleting path '{}'", path.display()));
        remove_tree(&path);
        self.reporter.done(&tool.name, "uninstalled");
        Ok(UninstallOutcome::Removed)
    }
}
