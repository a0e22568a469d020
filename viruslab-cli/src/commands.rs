use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use viruslab_config::ViruslabConfig;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/viruslab.yaml plus VIRUSLAB_* overrides.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a session, streaming the game log to stdout
    Play(PlayArgs),
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Wallet address to connect with; omit to play offline
    #[arg(long)]
    pub connect: Option<String>,
    /// Session length in seconds
    #[arg(long, default_value_t = 20)]
    pub duration_secs: u64,
    /// Units to deploy when the session starts
    #[arg(long, default_value_t = 0)]
    pub deploy: u32,
    /// Units to recall halfway through
    #[arg(long, default_value_t = 0)]
    pub recall: u32,
    /// Liquidate the position before leaving (connected sessions only)
    #[arg(long)]
    pub exit: bool,
    /// Seed every random source for a reproducible session
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print Prometheus metrics when the session ends
    #[arg(long)]
    pub metrics: bool,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<ViruslabConfig> {
    match path {
        Some(path) => ViruslabConfig::load_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => ViruslabConfig::load().context("loading configuration"),
    }
}

pub fn print_config(config: &ViruslabConfig) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(config).context("serializing configuration")?;
    print!("{yaml}");
    Ok(())
}
