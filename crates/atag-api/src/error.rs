use thiserror::Error;

/// Top-level error type for the `atag-api` crate.
///
/// Covers transport failures, non-200 device responses, and malformed
/// reply bodies. `atag-core` maps these into its own taxonomy; nothing
/// here is fatal to a long-running poller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device ──────────────────────────────────────────────────────
    /// The device answered with a non-200 status.
    #[error("Device returned HTTP {status}")]
    DeviceStatus { status: u16, body: String },

    /// Malformed or unexpected reply body (bad JSON, wrong envelope key).
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient failure worth retrying on the
    /// standard poll cadence.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::DeviceStatus { .. } => true,
            Self::InvalidUrl(_) => false,
            // A garbled reply usually means the device is mid-boot.
            Self::Protocol { .. } => true,
        }
    }

    /// Wrap a reqwest error, preserving timeout information.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }
}
