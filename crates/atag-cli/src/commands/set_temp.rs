//! `atag set-temp`: one update round trip, optional confirmation retrieve.

use atag_api::{AccStatus, InfoFlags};
use atag_core::{MonitorConfig, SETPOINT_MAX, SETPOINT_MIN};

use crate::cli::{GlobalOpts, SetTempArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: &MonitorConfig,
    args: SetTempArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Validate locally before any network traffic.
    if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&args.temperature) {
        return Err(CliError::Validation {
            field: "temperature".into(),
            reason: format!(
                "{}°C is out of range [{SETPOINT_MIN}, {SETPOINT_MAX}]",
                args.temperature
            ),
        });
    }

    let client = super::device_client(config)?;
    let reply = client.update(args.temperature).await?;

    match reply.acc_status() {
        Some(AccStatus::Authorized) if reply.acknowledged() => {}
        Some(AccStatus::Pending | AccStatus::Denied) | None => return Err(CliError::NotPaired),
        Some(AccStatus::NotReady) => return Err(CliError::DeviceBusy),
        Some(AccStatus::Authorized) => return Err(CliError::UpdateNotAcknowledged),
        Some(AccStatus::Unknown(raw)) => {
            return Err(CliError::Protocol {
                message: format!("unexpected acc_status {raw} in update reply"),
            });
        }
    }

    if args.no_verify {
        output::print_output(
            &format!("Target temperature set to {:.1}°C", args.temperature),
            global.quiet,
        );
        return Ok(());
    }

    // The device applies the setpoint asynchronously; read back what it
    // now reports as the target.
    let confirmed = client.retrieve(InfoFlags::default()).await?;
    let target = confirmed
        .control
        .as_ref()
        .and_then(|c| c.ch_mode_temp)
        .unwrap_or(args.temperature);

    output::print_output(
        &format!("Target temperature set to {target:.1}°C"),
        global.quiet,
    );
    Ok(())
}
