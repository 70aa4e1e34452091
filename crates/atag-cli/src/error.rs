//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use atag_config::ConfigError;
use atag_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the device at {host}:{port}")]
    #[diagnostic(
        code(atag::device_unreachable),
        help(
            "Check that the thermostat is on the local network.\n\
             Detail: {reason}"
        )
    )]
    DeviceUnreachable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(atag::timeout),
        help("Increase the timeout with --timeout or check the device's responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("Device is busy (not ready to answer)")]
    #[diagnostic(
        code(atag::device_busy),
        help("The device answers one client at a time. Try again in a minute.")
    )]
    DeviceBusy,

    // ── Authorization ────────────────────────────────────────────────

    #[error("Not paired with the device")]
    #[diagnostic(
        code(atag::not_paired),
        help("Run: atag pair\nThen confirm the request on the thermostat's display.")
    )]
    NotPaired,

    #[error("Pairing was denied on the device")]
    #[diagnostic(
        code(atag::pairing_denied),
        help(
            "Someone declined the pairing prompt on the thermostat.\n\
             Run `atag pair` again and accept it on the display."
        )
    )]
    PairingDenied,

    #[error("Pairing not confirmed within {seconds}s")]
    #[diagnostic(
        code(atag::pairing_timeout),
        help("Confirm the pairing prompt on the thermostat's display, then retry.")
    )]
    PairingTimeout { seconds: u64 },

    // ── Device / protocol ────────────────────────────────────────────

    #[error("Device rejected the request (HTTP {status})")]
    #[diagnostic(code(atag::device_rejected))]
    DeviceRejected { status: u16 },

    #[error("Unexpected reply from the device: {message}")]
    #[diagnostic(
        code(atag::protocol),
        help("The device firmware may be newer than this client understands.")
    )]
    Protocol { message: String },

    #[error("Device did not acknowledge the update")]
    #[diagnostic(
        code(atag::update_rejected),
        help("The setpoint was not applied. Check `atag status` and retry.")
    )]
    UpdateNotAcknowledged,

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(atag::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No device host configured")]
    #[diagnostic(
        code(atag::no_device_host),
        help(
            "Pass --host, set ATAG_HOST, or configure one with: atag config init\n\
             Expected config at: {path}"
        )
    )]
    NoDeviceHost { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(atag::config))]
    Config { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(atag::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DeviceUnreachable { .. } | Self::DeviceBusy => exit_code::CONNECTION,
            Self::NotPaired | Self::PairingDenied => exit_code::AUTH,
            Self::Timeout { .. } | Self::PairingTimeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoDeviceHost { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceUnreachable { host, port, reason } => {
                CliError::DeviceUnreachable { host, port, reason }
            }

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::MonitorStopped => CliError::Protocol {
                message: "monitor task stopped unexpectedly".into(),
            },

            CoreError::NotAuthorized => CliError::NotPaired,

            CoreError::PairingDenied => CliError::PairingDenied,

            CoreError::SetpointOutOfRange { value, min, max } => CliError::Validation {
                field: "temperature".into(),
                reason: format!("{value}°C is out of range [{min}, {max}]"),
            },

            CoreError::Protocol { message } => CliError::Protocol { message },

            CoreError::DeviceRejected { status } => CliError::DeviceRejected { status },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Protocol { message },
        }
    }
}

impl From<atag_api::Error> for CliError {
    fn from(err: atag_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoDeviceHost => CliError::NoDeviceHost {
                path: atag_config::settings_path().display().to_string(),
            },

            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },

            ConfigError::Io(e) => CliError::Io(e),

            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
