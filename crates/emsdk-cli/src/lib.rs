//! emsdk - Emscripten SDK manager
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Installs, activates and removes the tools that make up an Emscripten SDK.
//!
//! # Directory Layout
//!
//! ```text
//! <root>/
//! ├── emsdk_manifest.json            # tool and SDK definitions
//! ├── emscripten-releases-tags.json  # aliases and release hashes
//! ├── .emscripten                    # config of the active tools
//! ├── downloads/                     # fetched archives
//! ├── upstream/                      # installed release SDK
//! └── <tool>/<version>/              # every other install
//! ```

pub mod cmd;
pub mod session;
pub mod ui;

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use emsdk_core::{Assertions, BuildType, RepositoryOverride};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "emsdk")]
#[command(author, version, about = "emsdk - Emscripten SDK manager")]
pub struct Cli {
    /// Very verbose output, useful for debugging
    #[arg(short, long, global = true, env = "EMSDK_VERBOSE", value_parser = FalseyValueParser::new())]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true, env = "EMSDK_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Never draw progress in place (for logs)
    #[arg(long, global = true, env = "EMSDK_NOTTY", value_parser = FalseyValueParser::new())]
    pub notty: bool,

    /// emsdk root directory (default: the directory of the executable)
    #[arg(long, global = true, env = "EMSDK_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all available SDKs and tools and their installation status
    List {
        /// Also show historical versions
        #[arg(long)]
        old: bool,
        /// Show the composition of each SDK
        #[arg(long)]
        uses: bool,
    },
    /// Download and install tools or SDKs
    Install {
        /// Tool or SDK names, e.g. `latest`, `3.1.50`, `node-18.20.3-64bit`
        #[arg(required = true)]
        names: Vec<String>,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Remove a tool
    Uninstall {
        /// Tool name
        name: String,
    },
    /// Make tools or SDKs the active ones
    Activate {
        names: Vec<String>,
        /// Register the environment for the current user (Windows only)
        #[arg(long)]
        permanent: bool,
        /// Register the environment for all users (Windows only)
        #[arg(long)]
        system: bool,
        /// Deprecated spelling of --system
        #[arg(long, hide = true)]
        global: bool,
        /// Build type to activate, matching the one installed
        #[arg(long = "build", value_name = "TYPE", value_parser = build_type)]
        build_type: Option<BuildType>,
    },
    /// Update emsdk itself to the newest version
    Update,
    /// Print shell commands that set up the environment of the active tools
    #[command(name = "construct_env")]
    ConstructEnv,
}

/// Options for tools built from source.
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Number of cores to build with (default: one less than detected)
    #[arg(short = 'j', value_name = "N")]
    pub jobs: Option<usize>,
    /// Shallow git clones
    #[arg(long)]
    pub shallow: bool,
    /// CMake build type: Debug, Release, MinSizeRel or RelWithDebInfo
    #[arg(long = "build", value_name = "TYPE", value_parser = build_type)]
    pub build_type: Option<BuildType>,
    /// CMake generator
    #[arg(long)]
    pub generator: Option<String>,
    /// Build LLVM and clang tests
    #[arg(long)]
    pub build_tests: bool,
    /// Build LLVM with assertions
    #[arg(long, conflicts_with = "disable_assertions")]
    pub enable_assertions: bool,
    /// Build LLVM without assertions
    #[arg(long)]
    pub disable_assertions: bool,
    /// Clone a tool from a fork: `tool@https://github.com/<owner>/<repo>/tree/<ref>`
    #[arg(long, value_name = "TOOL@URL")]
    pub override_repository: Vec<RepositoryOverride>,
}

impl BuildArgs {
    pub fn assertions(&self) -> Assertions {
        if self.enable_assertions {
            Assertions::On
        } else if self.disable_assertions {
            Assertions::Off
        } else {
            Assertions::Auto
        }
    }
}

fn build_type(s: &str) -> Result<BuildType, String> {
    s.parse()
}

/// Final result of a command. A Ctrl-C wins over whatever the command
/// returned, so an interrupted run always ends as one.
pub fn settle(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if emsdk_core::interrupt::is_interrupted() {
        return Err(emsdk_core::Error::Interrupted.into());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_flags_parse() {
        let cli = Cli::try_parse_from([
            "emsdk",
            "install",
            "-j4",
            "--build=relwithdebinfo",
            "--disable-assertions",
            "--override-repository",
            "llvm-git-main-64bit@https://github.com/me/llvm-project/tree/fix",
            "sdk-main-64bit",
        ])
        .unwrap();
        let Commands::Install { names, build } = cli.command else {
            panic!("expected install");
        };
        assert_eq!(names, ["sdk-main-64bit"]);
        assert_eq!(build.jobs, Some(4));
        assert_eq!(build.build_type, Some(BuildType::RelWithDebInfo));
        assert_eq!(build.assertions(), Assertions::Off);
        assert_eq!(build.override_repository[0].refspec, "fix");
    }

    #[test]
    fn unknown_build_type_is_rejected() {
        let err = Cli::try_parse_from(["emsdk", "install", "--build=Fast", "latest"]).unwrap_err();
        assert!(err.to_string().contains("Unknown CMake build type"));
    }

    #[test]
    fn construct_env_keeps_its_name() {
        let cli = Cli::try_parse_from(["emsdk", "construct_env"]).unwrap();
        assert!(matches!(cli.command, Commands::ConstructEnv));
    }
}
