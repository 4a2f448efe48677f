//! One module per subcommand.

pub mod activate;
pub mod construct_env;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod update;
