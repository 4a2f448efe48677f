//! Version-control collaborator and its `git` command-line implementation.

use crate::Reporter;
use crate::error::{Error, Result};
use emsdk_schema::Os;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Clone-if-absent or update-in-place for git-sourced items.
pub trait Vcs {
    /// Clone `url` at `branch` into `dest`, or when `dest` is already a
    /// checkout, fetch and fast-forward it to `branch`.
    fn clone_or_pull(&self, url: &str, dest: &Path, branch: &str, reporter: &dyn Reporter) -> Result<()>;

    /// Hashes of the `n` most recent commits, newest first. Empty on failure.
    fn recent_commits(&self, repo: &Path, n: usize) -> Vec<String>;
}

/// [`Vcs`] running the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    os: Os,
    shallow: bool,
}

impl GitCli {
    pub fn new(root: &Path, os: Os, shallow: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            os,
            shallow,
        }
    }

    /// The git emsdk installed itself is preferred over the one on `PATH`.
    pub fn executable(&self) -> Result<PathBuf> {
        let bundled = self.root.join("git/1.9.4/bin/git.exe");
        let candidates = [Some(bundled), which::which("git").ok()];
        for git in candidates.into_iter().flatten() {
            let works = Command::new(&git)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|s| s.success());
            if works {
                return Ok(git);
            }
        }
        Err(Error::MissingProgram(missing_git_message(self.os).to_string()))
    }

    fn run(&self, args: &[&str], cwd: Option<&Path>, quiet: bool) -> Result<bool> {
        let git = self.executable()?;
        debug!("run(cmd={git:?} {args:?}, cwd={cwd:?})");
        let mut cmd = Command::new(git);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = cmd.status()?;
        Ok(status.success())
    }

    fn pull(&self, repo: &Path, branch: &str, reporter: &dyn Reporter) -> Result<()> {
        let fail = |op: &str| Error::Vcs {
            op: op.to_string(),
            path: repo.to_path_buf(),
        };
        reporter.info(&format!(
            "Fetching latest changes to the branch/tag '{branch}' for '{}'...",
            repo.display()
        ));
        if !self.run(&["fetch", "--quiet", "origin"], Some(repo), false)? {
            return Err(fail("fetch"));
        }
        if !self.run(&["checkout", "--recurse-submodules", "--quiet", branch], Some(repo), false)? {
            return Err(fail("checkout"));
        }
        let on_branch = self.run(&["symbolic-ref", "-q", "HEAD"], Some(repo), true)?;
        if on_branch && !self.run(&["merge", "--ff-only", &format!("origin/{branch}")], Some(repo), false)? {
            return Err(fail("merge"));
        }
        if let Err(e) = self.run(&["submodule", "update", "--init"], Some(repo), true) {
            debug!("submodule update failed: {e}");
        }
        reporter.info(&format!(
            "Successfully updated and checked out branch/tag '{branch}' on repository '{}'",
            repo.display()
        ));
        Ok(())
    }
}

impl Vcs for GitCli {
    fn clone_or_pull(&self, url: &str, dest: &Path, branch: &str, reporter: &dyn Reporter) -> Result<()> {
        debug!("git_clone_checkout_and_pull(url={url}, dstpath={}, branch={branch})", dest.display());
        if dest.join(".git").is_dir() {
            return self.pull(dest, branch, reporter);
        }
        std::fs::create_dir_all(dest).map_err(|e| Error::io_at(dest, &e))?;
        let dest_str = dest.to_string_lossy();
        let mut args = vec!["clone", "--recurse-submodules", "--branch", branch];
        if self.shallow {
            args.extend(["--depth", "1"]);
        }
        args.extend([url, dest_str.as_ref()]);
        reporter.info(&format!("Cloning from {url}..."));
        if self.run(&args, None, false)? {
            Ok(())
        } else {
            Err(Error::Vcs {
                op: "clone".to_string(),
                path: dest.to_path_buf(),
            })
        }
    }

    fn recent_commits(&self, repo: &Path, n: usize) -> Vec<String> {
        let Ok(git) = self.executable() else {
            return Vec::new();
        };
        let output = Command::new(git)
            .args(["log", "-n", &n.to_string(), "--pretty=\"%H\""])
            .current_dir(repo)
            .output();
        match output {
            Ok(out) if out.status.success() => parse_commit_list(&String::from_utf8_lossy(&out.stdout)),
            Ok(_) | Err(_) => Vec::new(),
        }
    }
}

fn parse_commit_list(stdout: &str) -> Vec<String> {
    stdout
        .replace(['\r', '"'], "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// What to tell the user when no git can be found.
pub fn missing_git_message(os: Os) -> &'static str {
    match os {
        Os::Windows => {
            "git executable was not found. Please install it by typing 'emsdk install git-1.9.4', or alternatively by installing it manually from http://git-scm.com/downloads . If you install git manually, remember to add it to PATH"
        }
        Os::MacOs => {
            "git executable was not found. Please install git for this operation! This can be done from http://git-scm.com/ , or by installing XCode and then the XCode Command Line Tools (see http://stackoverflow.com/questions/9329243/xcode-4-4-command-line-tools )"
        }
        Os::Linux => {
            "git executable was not found. Please install git for this operation! This can be probably be done using your package manager, see http://git-scm.com/book/en/Getting-Started-Installing-Git"
        }
    }
}
