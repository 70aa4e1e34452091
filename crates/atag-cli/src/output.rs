//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders reading batches in the format selected by `--output`. Table
//! uses `tabled`, structured formats use serde, plain emits one
//! `key value` pair per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use atag_core::Reading;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Flame indicator for the target-temperature row.
pub fn flame_indicator(flame: Option<bool>, color: bool) -> String {
    match flame {
        Some(true) if color => format!("{}", "burning".red()),
        Some(true) => "burning".into(),
        Some(false) => "idle".into(),
        None => String::new(),
    }
}

// ── Reading rows ─────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "Sensor")]
    pub sensor: &'static str,

    #[tabled(rename = "Value")]
    pub value: String,

    #[tabled(rename = "Flame")]
    pub flame: String,
}

pub fn reading_row(reading: &Reading, color: bool) -> ReadingRow {
    ReadingRow {
        sensor: reading.key.label(),
        value: format!("{}{}", reading.display, reading.key.unit()),
        flame: flame_indicator(reading.flame, color),
    }
}

/// Render a reading batch in the chosen format.
pub fn render_readings(format: &OutputFormat, readings: &[Reading], color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ReadingRow> = readings.iter().map(|r| reading_row(r, color)).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(readings, false),
        OutputFormat::JsonCompact => render_json(readings, true),
        OutputFormat::Yaml => render_yaml(readings),
        OutputFormat::Plain => readings
            .iter()
            .map(|r| format!("{} {}", serde_key(r), r.display))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Snake-case key name, matching the JSON serialization.
fn serde_key(reading: &Reading) -> String {
    serde_json::to_string(&reading.key)
        .map(|s| s.trim_matches('"').to_owned())
        .unwrap_or_default()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_default()
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_default()
}
