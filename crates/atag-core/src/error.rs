// ── Core error types ──
//
// User-facing errors from atag-core. Consumers never see raw reqwest
// failures; the `From<atag_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

use crate::session::{SETPOINT_MAX, SETPOINT_MIN};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ───────────────────────────────────────────
    #[error("Cannot reach device at {host}:{port}: {reason}")]
    DeviceUnreachable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Device request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Monitor is not running")]
    MonitorStopped,

    // ── Authorization errors ────────────────────────────────────────
    #[error("Not paired with the device -- run pairing first")]
    NotAuthorized,

    #[error("Pairing denied on the device")]
    PairingDenied,

    // ── Validation errors ───────────────────────────────────────────
    #[error("Setpoint {value}°C out of range [{min}, {max}]")]
    SetpointOutOfRange { value: f64, min: f64, max: f64 },

    // ── Protocol errors ─────────────────────────────────────────────
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Device rejected the request (HTTP {status})")]
    DeviceRejected { status: u16 },

    // ── Configuration errors ────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ─────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Out-of-range setpoint error with the fixed protocol bounds.
    pub fn setpoint_out_of_range(value: f64) -> Self {
        Self::SetpointOutOfRange {
            value,
            min: SETPOINT_MIN,
            max: SETPOINT_MAX,
        }
    }
}

// ── Conversion from transport-layer errors ──────────────────────────

impl From<atag_api::Error> for CoreError {
    fn from(err: atag_api::Error) -> Self {
        match err {
            atag_api::Error::Transport(ref e) if e.is_connect() => CoreError::DeviceUnreachable {
                host: e
                    .url()
                    .and_then(|u| u.host_str().map(ToOwned::to_owned))
                    .unwrap_or_else(|| "<unknown>".into()),
                port: e.url().and_then(|u| u.port()).unwrap_or(0),
                reason: e.to_string(),
            },
            atag_api::Error::Transport(e) => CoreError::Internal(e.to_string()),
            atag_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid device URL: {e}"),
            },
            atag_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            atag_api::Error::DeviceStatus { status, .. } => CoreError::DeviceRejected { status },
            atag_api::Error::Protocol { message, .. } => CoreError::Protocol { message },
        }
    }
}
