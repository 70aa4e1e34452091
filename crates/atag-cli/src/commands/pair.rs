//! `atag pair`: the multi-round pairing handshake.
//!
//! Each attempt sends one pair request; the device answers `pending`
//! until someone confirms the prompt on its display, then `authorized`
//! (or `denied`). We poll at a fixed interval until the status settles
//! or the deadline passes.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use atag_api::AccStatus;
use atag_core::MonitorConfig;

use crate::cli::{GlobalOpts, PairArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: &MonitorConfig,
    args: PairArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = super::device_client(config)?;
    let deadline = Instant::now() + Duration::from_secs(args.timeout);
    let mut announced = false;

    loop {
        let reply = client.pair().await?;

        match reply.acc_status() {
            Some(AccStatus::Authorized) => {
                output::print_output(
                    &format!("Paired with {} as '{}'", config.host, config.identity.device_name),
                    global.quiet,
                );
                return Ok(());
            }

            Some(AccStatus::Denied) => return Err(CliError::PairingDenied),

            Some(AccStatus::Unknown(raw)) => {
                return Err(CliError::Protocol {
                    message: format!("unexpected acc_status {raw} in pair reply"),
                });
            }

            // Pending and not-ready both mean: keep asking.
            Some(AccStatus::Pending | AccStatus::NotReady) | None => {
                if !announced {
                    eprintln!("Waiting for confirmation on the thermostat's display...");
                    announced = true;
                }
            }
        }

        if Instant::now() + Duration::from_secs(args.interval) > deadline {
            return Err(CliError::PairingTimeout {
                seconds: args.timeout,
            });
        }
        sleep(Duration::from_secs(args.interval)).await;
    }
}
