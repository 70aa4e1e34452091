// ── Runtime monitor configuration ──
//
// These types describe *how* to poll one Atag One device. They carry
// connection tuning and retry policy, but never touch disk -- the CLI (via
// atag-config) constructs a `MonitorConfig` and hands it in.

use std::time::Duration;

use atag_api::HostIdentity;

/// Countdown values, in heartbeat ticks, for scheduling the next protocol
/// action.
///
/// These are policy, not protocol: 1 means "retry almost immediately"
/// (mid-handshake), 6 is the standard poll interval (~1 minute at a 10s
/// heartbeat), 12 backs off while the device reports not-ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry on the next tick (pairing handshake in progress).
    pub immediate: i32,
    /// Standard poll cadence and transient-failure backoff.
    pub standard: i32,
    /// Device reported not-ready; wait longer.
    pub device_busy: i32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            immediate: 1,
            standard: 6,
            device_busy: 12,
        }
    }
}

/// Configuration for polling a single device.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Device IP address or hostname.
    pub host: String,
    /// Device API port.
    pub port: u16,
    /// How this client identifies itself in every envelope.
    pub identity: HostIdentity,
    /// Heartbeat tick period; countdowns are counted in these ticks.
    pub heartbeat: Duration,
    /// Per-request (and connect-probe) timeout.
    pub timeout: Duration,
    /// Countdown policy values.
    pub retry: RetryPolicy,
}

impl MonitorConfig {
    /// Config for a device at `host` with defaults everywhere else.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: atag_api::DEVICE_PORT,
            identity: HostIdentity::new("01:23:45:67:89:01", "atag-one-local"),
            heartbeat: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}
