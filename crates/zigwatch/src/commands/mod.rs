//! Command handlers.

pub mod config_cmd;
pub mod devices;
pub mod monitor;
pub mod topics;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::RunTarget;
use crate::error::{CliError, exit_code};

/// Dispatch a broker-facing command to its handler. Returns the process
/// exit code.
pub async fn dispatch(
    command: Command,
    target: RunTarget,
    global: &GlobalOpts,
) -> Result<i32, CliError> {
    match command {
        Command::Monitor(args) => monitor::handle(target, args, global).await,
        Command::Devices(args) => devices::handle(target, args, global).await,
        Command::Topics(args) => topics::handle(target, args, global).await,
        Command::Watch(args) => watch::handle(target, args, global).await,
        // Handled before dispatch; unreachable by construction.
        Command::Config(_) | Command::Completions(_) => Ok(exit_code::SUCCESS),
    }
}
