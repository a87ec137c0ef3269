//! Command dispatch: bridges CLI args -> `Hub` calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod logs;
pub mod open;
pub mod util;

use elka_core::Hub;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(hub, args, global).await,
        Command::Devices(args) => devices::handle(hub, args, global).await,
        Command::Logs => logs::handle_logs(hub, global).await,
        Command::Users(args) => logs::handle_users(hub, args, global).await,
        Command::Open { path } => open::handle(hub, &path, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
