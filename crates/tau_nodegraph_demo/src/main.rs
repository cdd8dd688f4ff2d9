// SPDX-License-Identifier: MIT OR Apache-2.0
//! `tau_nodegraph` demo.
//!
//! Builds a few small dataflow graphs by kind and port name, evaluates them
//! and prints the results together with how many node evaluations each pass
//! needed.

mod config;
mod scenarios;

use clap::Parser;
use config::{ConfigError, DemoConfig};
use scenarios::{Runner, ScenarioError};
use std::path::PathBuf;
use tau_nodegraph::NodeRegistry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Evaluate sample dataflow graphs
#[derive(Parser, Debug)]
#[command(name = "tau_nodegraph_demo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compute nodes shared by several paths once per pass
    #[arg(long)]
    memoize: bool,

    /// Print every registered node kind and exit
    #[arg(long)]
    list_kinds: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(cli: &Cli, config: &DemoConfig) -> Result<(), DemoError> {
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        tracing::info!(path = %path.display(), "configuration written");
        return Ok(());
    }
    if cli.list_kinds {
        let registry = NodeRegistry::with_operators();
        for node_type in registry.types() {
            println!("{:<28} {:?}", node_type.id, node_type.category);
        }
        return Ok(());
    }

    let memoize = cli.memoize || config.memoize;
    tracing::debug!(memoize, "running scenarios");
    for report in Runner::new(memoize).run_all(config)? {
        println!("{report}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path),
        None => Ok(DemoConfig::default()),
    };
    let filter = config
        .as_ref()
        .map_or_else(|_| DemoConfig::default().log_filter, |c| c.log_filter.clone());
    init_tracing(&filter);

    tracing::info!("Starting tau_nodegraph demo v{}", env!("CARGO_PKG_VERSION"));

    let result = config.map_err(DemoError::from).and_then(|config| run(&cli, &config));
    if let Err(e) = result {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
