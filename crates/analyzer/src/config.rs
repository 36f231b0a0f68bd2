//! Analyzer configuration

use analyzer_lib::{RuleSet, RunConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the optional configuration file
const DEFAULT_CONFIG_FILE: &str = "/etc/security-analyzer/config.toml";

/// List-valued keys parsed from comma-separated environment variables
const LIST_KEYS: &[&str] = &[
    "include_namespaces",
    "exclude_namespaces",
    "enable_rules",
    "disable_rules",
];

/// Analyzer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Cluster name attached to every log record
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds between analysis runs
    #[serde(default = "default_analysis_interval")]
    pub analysis_interval_secs: u64,

    /// Bound on each Kubernetes API call in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Run immediately at startup instead of waiting one interval
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,

    #[serde(default)]
    pub include_namespaces: Vec<String>,

    #[serde(default)]
    pub exclude_namespaces: Vec<String>,

    /// Optional rules to turn on
    #[serde(default)]
    pub enable_rules: Vec<String>,

    /// Default rules to turn off
    #[serde(default)]
    pub disable_rules: Vec<String>,

    /// Write the latest run report as JSON to this path
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

fn default_cluster_name() -> String {
    std::env::var("CLUSTER_NAME").unwrap_or_else(|_| "default".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_analysis_interval() -> u64 {
    12 * 60 * 60
}

fn default_call_timeout() -> u64 {
    30
}

fn default_run_on_start() -> bool {
    true
}

impl AnalyzerConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("ANALYZER_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from `path` (if it exists), overlaid by `ANALYZER_*` variables
    pub fn load_from(path: &Path) -> Result<Self> {
        let environment = LIST_KEYS.iter().fold(
            config::Environment::with_prefix("ANALYZER")
                .try_parsing(true)
                .list_separator(","),
            |env, key| env.with_list_parse_key(key),
        );

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()
            .context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid analyzer configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.analysis_interval_secs == 0 {
            anyhow::bail!("analysis_interval_secs must be greater than zero");
        }
        if self.call_timeout_secs == 0 {
            anyhow::bail!("call_timeout_secs must be greater than zero");
        }
        self.rule_set().map(|_| ())
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs(self.analysis_interval_secs)
    }

    /// Rule set with the configured toggles applied
    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::with_overrides(&self.enable_rules, &self.disable_rules)
            .context("Invalid rule configuration")
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            include_namespaces: self.include_namespaces.clone(),
            exclude_namespaces: self.exclude_namespaces.clone(),
        }
    }
}
