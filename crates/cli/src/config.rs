//! Configuration management for the CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Namespaces analyzed when `--namespace` is not given
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Namespaces skipped when `--exclude` is not given
    #[serde(default)]
    pub exclude_namespaces: Vec<String>,
    /// Default output format
    pub default_format: Option<OutputFormat>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("pssctl").join("config.json"))
    }

    /// Command-line values win over configured defaults
    pub fn namespaces_or(&self, flags: Vec<String>) -> Vec<String> {
        if flags.is_empty() {
            self.namespaces.clone()
        } else {
            flags
        }
    }

    pub fn exclude_or(&self, flags: Vec<String>) -> Vec<String> {
        if flags.is_empty() {
            self.exclude_namespaces.clone()
        } else {
            flags
        }
    }

    pub fn format_or(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.default_format).unwrap_or_default()
    }
}

/// Build a Kubernetes client from an explicit kubeconfig or the default chain
pub async fn kube_client(kubeconfig: Option<&Path>) -> Result<kube::Client> {
    let Some(path) = kubeconfig else {
        return kube::Client::try_default()
            .await
            .context("Failed to create Kubernetes client");
    };

    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context("Failed to load kubeconfig")?;

    kube::Client::try_from(config).context("Failed to create Kubernetes client")
}
