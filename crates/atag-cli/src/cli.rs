//! Clap derive structures for the `atag` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// atag -- CLI for the Atag One thermostat's local API
#[derive(Debug, Parser)]
#[command(
    name = "atag",
    version,
    about = "Read and control an Atag One thermostat over the local network",
    long_about = "Talks directly to the thermostat's local HTTP API on port 10000.\n\n\
        The device authorizes clients by a MAC-like identity confirmed once\n\
        on its display; run `atag pair` before anything else.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device IP address or hostname (overrides the config file)
    #[arg(long, short = 'H', env = "ATAG_HOST", global = true)]
    pub host: Option<String>,

    /// Device API port
    #[arg(long, env = "ATAG_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ATAG_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ATAG_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current temperatures and boiler state
    #[command(alias = "st")]
    Status,

    /// Poll the device continuously and print readings as they change
    Watch(WatchArgs),

    /// Set the target room temperature
    #[command(name = "set-temp", alias = "set")]
    SetTemp(SetTempArgs),

    /// Pair this client with the device (confirm on its display)
    Pair(PairArgs),

    /// Manage the CLI configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long, short = 'd')]
    pub duration: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SetTempArgs {
    /// Target temperature in °C (4.0 to 27.0)
    #[arg(value_name = "TEMPERATURE")]
    pub temperature: f64,

    /// Skip the confirmation retrieve after the update
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Debug, Args)]
pub struct PairArgs {
    /// Give up after this many seconds without confirmation
    #[arg(long, default_value = "120")]
    pub timeout: u64,

    /// Seconds between pairing attempts while pending
    #[arg(long, default_value = "5")]
    pub interval: u64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the current settings
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
