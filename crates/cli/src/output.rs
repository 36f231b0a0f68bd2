//! Output formatting utilities

use analyzer_lib::{ClusterStatus, SecurityTier};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a percentage with two decimals
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Color a tier by how permissive it is
pub fn color_tier(tier: SecurityTier) -> String {
    let name = tier.as_str();
    match tier {
        SecurityTier::Restricted => name.green().to_string(),
        SecurityTier::Baseline => name.yellow().to_string(),
        SecurityTier::Privileged => name.red().to_string(),
    }
}

pub fn color_status(status: ClusterStatus) -> String {
    let name = status.to_string();
    match status {
        ClusterStatus::Healthy => name.green().bold().to_string(),
        ClusterStatus::Alert => name.red().bold().to_string(),
    }
}

/// Color a percentage of restricted workloads
pub fn color_percent(value: f64) -> String {
    let formatted = format_percent(value);
    if value >= 80.0 {
        formatted.green().to_string()
    } else if value >= 50.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(33.33), "33.33%");
        assert_eq!(format_percent(100.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_colored_values_keep_text() {
        colored::control::set_override(false);
        assert_eq!(color_tier(SecurityTier::Baseline), "baseline");
        assert_eq!(color_status(ClusterStatus::Alert), "alert");
        assert_eq!(color_percent(66.67), "66.67%");
    }
}
