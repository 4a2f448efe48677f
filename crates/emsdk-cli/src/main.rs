//! emsdk - Emscripten SDK manager
#![allow(missing_docs)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use emsdk_cli::cmd;
use emsdk_cli::cmd::activate::ActivateFlags;
use emsdk_cli::session::{self, Session};
use emsdk_cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    emsdk_core::interrupt::install_handler();

    match emsdk_cli::settle(run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::List { old, uses } => {
            let session = Session::open(cli, session::settings(None)?)?;
            cmd::list::list(&session, *old, *uses)
        }
        Commands::Install { names, build } => {
            let session = Session::open(cli, session::settings(Some(build))?)?;
            cmd::install::install(&session, names, build)
        }
        Commands::Uninstall { name } => {
            let session = Session::open(cli, session::settings(None)?)?;
            cmd::uninstall::uninstall(&session, name)
        }
        Commands::Activate {
            names,
            permanent,
            system,
            global,
            build_type,
        } => {
            let mut settings = session::settings(None)?;
            settings.build_type = *build_type;
            let session = Session::open(cli, settings)?;
            let flags = ActivateFlags {
                permanent: *permanent,
                system: *system,
                global: *global,
            };
            cmd::activate::activate(&session, names, flags)
        }
        Commands::Update => {
            let session = Session::open(cli, session::settings(None)?)?;
            cmd::update::update(&session)
        }
        Commands::ConstructEnv => {
            let session = Session::open(cli, session::settings(None)?)?;
            cmd::construct_env::construct_env(&session)
        }
    }
}
