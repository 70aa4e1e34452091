//! Config subcommand handlers.

use atag_config::{Settings, load_settings, save_settings, settings_path};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: write a starting config file ──────────────────────
        ConfigCommand::Init => {
            let mut settings = Settings::default();
            settings.device.host = global.host.clone();
            if let Some(port) = global.port {
                settings.device.port = port;
            }

            save_settings(&settings)?;
            output::print_output(
                &format!("Wrote {}", settings_path().display()),
                global.quiet,
            );
            if settings.device.host.is_none() {
                eprintln!("No device host set yet; edit the file or pass --host next time.");
            }
            Ok(())
        }

        // ── Show: resolved settings as TOML ─────────────────────────
        ConfigCommand::Show => {
            let settings = load_settings()?;
            let rendered = toml::to_string_pretty(&settings).map_err(|e| CliError::Config {
                message: e.to_string(),
            })?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&settings_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
