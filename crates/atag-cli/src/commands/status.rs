//! `atag status`: one retrieve round trip, rendered readings.

use atag_api::{AccStatus, InfoFlags};
use atag_core::{MonitorConfig, extract_readings};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(config: &MonitorConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let client = super::device_client(config)?;
    let reply = client.retrieve(InfoFlags::default()).await?;

    match reply.acc_status() {
        Some(AccStatus::Authorized) => {
            let readings = extract_readings(&reply)?;
            let color = output::should_color(&global.color);
            let rendered = output::render_readings(&global.output, &readings, color);
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        Some(AccStatus::NotReady) => Err(CliError::DeviceBusy),
        Some(AccStatus::Pending | AccStatus::Denied) | None => Err(CliError::NotPaired),
        Some(AccStatus::Unknown(raw)) => Err(CliError::Protocol {
            message: format!("unexpected acc_status {raw} in retrieve reply"),
        }),
    }
}
