//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: f64) -> String {
    const KI: f64 = 1024.0;
    const MI: f64 = KI * 1024.0;
    const GI: f64 = MI * 1024.0;
    const TI: f64 = GI * 1024.0;

    if bytes >= TI {
        format!("{:.2}Ti", bytes / TI)
    } else if bytes >= GI {
        format!("{:.2}Gi", bytes / GI)
    } else if bytes >= MI {
        format!("{:.2}Mi", bytes / MI)
    } else if bytes >= KI {
        format!("{:.2}Ki", bytes / KI)
    } else {
        format!("{}B", bytes)
    }
}

/// Format cores as human-readable string
pub fn format_cpu(cores: f64) -> String {
    if cores >= 1.0 {
        format!("{:.1}", cores)
    } else {
        format!("{}m", (cores * 1000.0).round())
    }
}

/// Color a validation verdict
pub fn color_verdict(valid: bool) -> String {
    if valid {
        "valid".green().to_string()
    } else {
        "invalid".red().to_string()
    }
}
