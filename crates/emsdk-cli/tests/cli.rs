//! End-to-end runs of the `emsdk` binary against a throwaway root.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const MANIFEST: &str = r#"{
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

const RELEASES: &str = r#"{
  "aliases": {"latest": "2.0.1"},
  "releases": {"2.0.1": "abc123", "2.0.0": "0ld0ld"}
}"#;

/// A throwaway emsdk root the binary is pointed at through `EMSDK_ROOT`.
struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("emsdk_manifest.json"), MANIFEST).unwrap();
        fs::write(dir.path().join("emscripten-releases-tags.json"), RELEASES).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn emsdk(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_emsdk"))
            .args(args)
            .env("EMSDK_ROOT", self.path())
            .env("EMSDK_OS", "linux")
            .env("EMSDK_ARCH", "x86_64")
            .env("EMSDK_NOTTY", "1")
            .env_remove("EMSDK_QUIET")
            .env_remove("EMSDK_VERBOSE")
            .output()
            .expect("failed to run emsdk")
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let root = TestRoot::new();
    let out = root.emsdk(&["--help"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Usage:"));
    assert!(stdout(&out).contains("construct_env"));
}

#[test]
fn test_list_shows_releases_and_tools() {
    let root = TestRoot::new();
    let out = root.emsdk(&["list"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("The *recommended* precompiled SDK download is 2.0.1 (abc123)."));
    assert!(text.contains("         2.0.1    \n"));
    assert!(text.contains("node-16.20.0-64bit"));
    assert!(text.contains("sdk-releases-abc123-64bit"));
    assert!(text.contains("emsdk list --old"));
    assert!(text.find("2.0.1").unwrap() < text.find("2.0.0").unwrap());
}

#[test]
fn test_list_uses_shows_sdk_composition() {
    let root = TestRoot::new();
    let out = root.emsdk(&["list", "--uses"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("          - node-16.20.0-64bit"));
}

#[test]
fn test_unknown_install_fails() {
    let root = TestRoot::new();
    let out = root.emsdk(&["install", "nonexistent-1.0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error:"));
    assert!(stderr(&out).contains("nonexistent-1.0"));
}

#[test]
fn test_fastcomp_is_refused() {
    let root = TestRoot::new();
    let out = root.emsdk(&["install", "sdk-fastcomp-1.38.0-64bit"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("fastcomp"));
}

#[test]
fn test_uninstall_unknown_tool() {
    let root = TestRoot::new();
    let out = root.emsdk(&["uninstall", "zzz"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Tool by name 'zzz' was not found."));
}

#[test]
fn test_activate_uninstalled_tool_fails() {
    let root = TestRoot::new();
    let out = root.emsdk(&["activate", "node-16.20.0-64bit"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("node-16.20.0-64bit"));
    assert!(!root.path().join(".emscripten").exists());
}

#[test]
fn test_construct_env_prints_shell_code_only() {
    let root = TestRoot::new();
    let out = root.emsdk(&["construct_env"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("export EMSDK=\""));
    assert!(text.lines().all(|l| l.starts_with("export ") || l.starts_with("unset ")));
    assert!(stderr(&out).contains("Setting up EMSDK environment"));
}

#[test]
fn test_update_refuses_git_checkout() {
    let root = TestRoot::new();
    fs::create_dir(root.path().join(".git")).unwrap();
    let out = root.emsdk(&["update"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("git pull"));
}
