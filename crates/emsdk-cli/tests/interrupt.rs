//! A Ctrl-C decides how a command ends. Lives in its own binary because
//! the interrupt flag is process-wide; every test raises it first.

use anyhow::anyhow;
use clap::Parser;
use emsdk_cli::cmd::activate::{ActivateFlags, activate};
use emsdk_cli::session::{self, Session};
use emsdk_cli::{Cli, Commands};
use emsdk_core::Error;
use std::fs;

fn interrupted(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<Error>(), Some(Error::Interrupted))
}

#[test]
fn interrupt_overrides_the_command_result() {
    emsdk_core::interrupt::trigger();

    for result in [Ok(()), Err(anyhow!("could not reach the server"))] {
        let err = emsdk_cli::settle(result).unwrap_err();
        assert!(interrupted(&err));
        assert_eq!(err.to_string(), "aborted by user, exiting");
    }
}

#[test]
fn interrupted_activation_leaves_the_config_alone() {
    emsdk_core::interrupt::trigger();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("emsdk_manifest.json"),
        r#"{"tools": [{"id": "cfg", "version": "1", "activated_cfg": "FOO='bar'"}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("emscripten-releases-tags.json"),
        r#"{"aliases": {"latest": "1.0.0"}, "releases": {"1.0.0": "abc"}}"#,
    )
    .unwrap();

    let root = dir.path().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["emsdk", "--quiet", "--root", root.as_str(), "activate", "cfg-1"]).unwrap();
    let Commands::Activate { names, .. } = &cli.command else {
        panic!("expected activate");
    };
    let session = Session::open(&cli, session::settings(None).unwrap()).unwrap();

    let err = activate(&session, names, ActivateFlags::default()).unwrap_err();
    assert!(interrupted(&err));
    assert!(!dir.path().join(".emscripten").exists());
}
