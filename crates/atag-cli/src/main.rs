mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use atag_core::MonitorConfig;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "atag", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a configured device
        cmd => {
            let config = build_monitor_config(&cli.global)?;

            tracing::debug!(command = ?cmd, host = %config.host, "dispatching command");
            commands::dispatch(cmd, config, &cli.global).await
        }
    }
}

/// Build a `MonitorConfig` from the settings file, env vars, and CLI flags.
fn build_monitor_config(global: &cli::GlobalOpts) -> Result<MonitorConfig, CliError> {
    let settings = atag_config::load_settings()?;
    let mut config = atag_config::to_monitor_config(&settings, global.host.as_deref())?;

    if let Some(port) = global.port {
        config.port = port;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = std::time::Duration::from_secs(timeout);
    }

    Ok(config)
}
