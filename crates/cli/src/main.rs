//! Pod Security Standards analyzer CLI
//!
//! A command-line tool for one-off security posture analysis of a cluster
//! (or an offline snapshot) and for browsing the rule catalog.

mod commands;
mod config;
mod output;

use analyzer_lib::{KubeWorkloadSource, SnapshotSource, WorkloadSource};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, rules};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Pod Security Standards analyzer CLI
#[derive(Parser)]
#[command(name = "pssctl")]
#[command(author, version, about = "Pod Security Standards posture analyzer", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Output format
    #[arg(long, short, env = "PSSCTL_FORMAT", global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze workloads and report the recommended tier per namespace
    Analyze {
        /// Only analyze this namespace (repeatable)
        #[arg(long = "namespace", short = 'n')]
        namespaces: Vec<String>,

        /// Skip this namespace (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Read workloads from a JSON snapshot instead of the cluster
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Turn on an optional rule (repeatable)
        #[arg(long = "enable-rule")]
        enable_rules: Vec<String>,

        /// Turn off a default rule (repeatable)
        #[arg(long = "disable-rule")]
        disable_rules: Vec<String>,

        /// Timeout in seconds for each Kubernetes API call
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,

        /// Also print issues and recommendations per workload
        #[arg(long)]
        details: bool,
    },

    /// List the rule catalog
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;
    let format = config.format_or(cli.format);

    match cli.command {
        Commands::Analyze {
            namespaces,
            exclude,
            snapshot,
            enable_rules,
            disable_rules,
            timeout,
            details,
        } => {
            let source: Arc<dyn WorkloadSource> = match snapshot {
                Some(path) => Arc::new(SnapshotSource::from_file(&path)?),
                None => {
                    let client = config::kube_client(cli.kubeconfig.as_deref()).await?;
                    Arc::new(KubeWorkloadSource::new(client))
                }
            };

            let options = analyze::AnalyzeOptions {
                namespaces: config.namespaces_or(namespaces),
                exclude: config.exclude_or(exclude),
                enable_rules,
                disable_rules,
                timeout: Duration::from_secs(timeout),
                details,
            };
            analyze::analyze(source, &options, format).await?;
        }
        Commands::Rules => rules::list_rules(format)?,
    }

    Ok(())
}
