//! Command dispatch: bridges CLI args -> device operations -> output.

pub mod config_cmd;
pub mod pair;
pub mod set_temp;
pub mod status;
pub mod watch;

use atag_core::MonitorConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: MonitorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(&config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::SetTemp(args) => set_temp::handle(&config, args, global).await,
        Command::Pair(args) => pair::handle(&config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Build a one-shot device client from the monitor config.
pub(crate) fn device_client(config: &MonitorConfig) -> Result<atag_api::DeviceClient, CliError> {
    let transport = atag_api::TransportConfig {
        timeout: config.timeout,
        ..atag_api::TransportConfig::default()
    };
    atag_api::DeviceClient::new(&config.host, config.port, config.identity.clone(), &transport)
        .map_err(CliError::from)
}
