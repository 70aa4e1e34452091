//! `atag watch`: run the polling monitor and stream changed readings.

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration, sleep};

use atag_core::{ConnectionState, Monitor, MonitorConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: MonitorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    let (monitor, handle) = Monitor::new(config)?;
    let task = tokio::spawn(monitor.run());

    let mut readings = handle.readings();
    let mut connection = handle.connection();

    let deadline = args.duration.map(Duration::from_secs);
    let stop = async {
        match deadline {
            Some(d) => sleep(d).await,
            None => {
                // Ctrl-C is the only way out in unbounded mode; a signal
                // registration failure would leave no way to stop.
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => break,

            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                if !global.quiet {
                    eprintln!("{} connection: {}", timestamp(), describe(state));
                }
            }

            received = readings.recv() => {
                match received {
                    Ok(reading) => {
                        if !global.quiet {
                            let flame = output::flame_indicator(reading.flame, color);
                            let line = format!(
                                "{} {:<22} {}{} {}",
                                timestamp(),
                                reading.key.label(),
                                reading.display,
                                reading.key.unit(),
                                flame,
                            );
                            println!("{}", line.trim_end());
                        }
                    }
                    // Dropped messages are fine; the next poll republishes.
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    handle.shutdown();
    let _ = task.await;
    Ok(())
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn describe(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
    }
}
