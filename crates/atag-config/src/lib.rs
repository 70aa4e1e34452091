//! Shared configuration for the atag CLI.
//!
//! TOML settings file at the platform config dir, merged with `ATAG_*`
//! environment variables, and translated to `atag_core::MonitorConfig`.
//! There are no credentials here: the local device API authorizes by the
//! MAC-like host identity confirmed during pairing.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atag_core::{MonitorConfig, RetryPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device host configured (set device.host or pass --host)")]
    NoDeviceHost,

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML settings structs ───────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub identity: IdentitySection,

    #[serde(default)]
    pub poll: PollSection,
}

/// Which device to talk to.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Device IP address or hostname.
    pub host: Option<String>,

    /// Device API port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
        }
    }
}

/// How this client identifies itself to the device.
#[derive(Debug, Deserialize, Serialize)]
pub struct IdentitySection {
    /// Stable MAC-like pairing identifier.
    #[serde(default = "default_mac")]
    pub mac: String,

    /// Name shown in the device's pairing prompt.
    #[serde(default = "default_device_name")]
    pub name: String,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            mac: default_mac(),
            name: default_device_name(),
        }
    }
}

/// Poll cadence and retry tuning. All countdowns are in heartbeat ticks.
#[derive(Debug, Deserialize, Serialize)]
pub struct PollSection {
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Ticks for "retry almost immediately" (pairing handshake).
    #[serde(default = "default_immediate_ticks")]
    pub immediate_ticks: i32,

    /// Ticks for the standard poll cadence and transient backoff.
    #[serde(default = "default_standard_ticks")]
    pub standard_ticks: i32,

    /// Ticks to wait while the device reports not-ready.
    #[serde(default = "default_device_busy_ticks")]
    pub device_busy_ticks: i32,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            timeout_secs: default_timeout_secs(),
            immediate_ticks: default_immediate_ticks(),
            standard_ticks: default_standard_ticks(),
            device_busy_ticks: default_device_busy_ticks(),
        }
    }
}

fn default_port() -> u16 {
    10000
}
fn default_mac() -> String {
    "01:23:45:67:89:01".into()
}
fn default_device_name() -> String {
    "atag-one-local".into()
}
fn default_heartbeat_secs() -> u64 {
    10
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_immediate_ticks() -> i32 {
    1
}
fn default_standard_ticks() -> i32 {
    6
}
fn default_device_busy_ticks() -> i32 {
    12
}

// ── Settings file path ──────────────────────────────────────────────

/// Resolve the settings file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    ProjectDirs::from("io", "atag", "atag").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("atag");
    p
}

// ── Settings loading / saving ───────────────────────────────────────

/// Load settings from file + environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_path())
}

/// Load settings from an explicit file path + environment.
///
/// Merge order (later wins): built-in defaults, the TOML file, `ATAG_*`
/// env vars (`ATAG_DEVICE_HOST`, `ATAG_POLL_HEARTBEAT_SECS`, ...).
pub fn load_settings_from(path: &std::path::Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ATAG_").split("_"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Load settings, falling back to defaults if the file is absent/broken.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_default()
}

/// Serialize settings to TOML and write to the canonical path.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let path = settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `MonitorConfig`, with an optional host override (CLI flag).
pub fn to_monitor_config(
    settings: &Settings,
    host_override: Option<&str>,
) -> Result<MonitorConfig, ConfigError> {
    let host = host_override
        .map(ToOwned::to_owned)
        .or_else(|| settings.device.host.clone())
        .ok_or(ConfigError::NoDeviceHost)?;

    if settings.poll.heartbeat_secs == 0 {
        return Err(ConfigError::Validation {
            field: "poll.heartbeat_secs".into(),
            reason: "must be greater than zero".into(),
        });
    }

    Ok(MonitorConfig {
        host,
        port: settings.device.port,
        identity: atag_core::HostIdentity::new(
            settings.identity.mac.clone(),
            settings.identity.name.clone(),
        ),
        heartbeat: Duration::from_secs(settings.poll.heartbeat_secs),
        timeout: Duration::from_secs(settings.poll.timeout_secs),
        retry: RetryPolicy {
            immediate: settings.poll.immediate_ticks,
            standard: settings.poll.standard_ticks,
            device_busy: settings.poll.device_busy_ticks,
        },
    })
}
