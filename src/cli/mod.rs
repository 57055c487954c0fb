//! CLI module for Switchboard
//!
//! # Commands
//!
//! - `run` - Start the routing core with background health monitoring
//! - `check` - Probe every configured backend once and print its health
//! - `route` - Route a single prompt through the configured policies
//! - `config` - Configuration utilities (init)
//!
//! # Example
//!
//! ```bash
//! switchboard config init
//! switchboard check --json
//! switchboard route --org acme --model llama-3-8b --prompt "hello"
//! ```

pub mod check;
pub mod config;
pub mod output;
pub mod route;
pub mod run;

pub use config::handle_config_init;

use crate::config::SwitchboardConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "switchboard.toml";

/// Switchboard - health-aware routing core for inference gateways
#[derive(Parser, Debug)]
#[command(
    name = "switchboard",
    version,
    about = "Health-aware weighted routing and failover for model inference backends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start health monitoring and keep routing state warm until shutdown
    Run(RunArgs),
    /// Probe every configured backend once
    Check(CheckArgs),
    /// Route one prompt and print the response
    Route(RouteArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override deployment environment
    #[arg(short, long, env = "SWITCHBOARD_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SWITCHBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable health checks
    #[arg(long)]
    pub no_health_check: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Organization the request is routed for
    #[arg(long = "org")]
    pub organization: String,

    /// Model name to route
    #[arg(short, long)]
    pub model: String,

    /// Prompt text
    #[arg(short, long)]
    pub prompt: String,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Only pick a backend, do not forward the request
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Load the config file if present, otherwise defaults, then apply
/// `SWITCHBOARD_*` overrides.
pub fn load_config(path: &Path) -> Result<SwitchboardConfig, crate::config::ConfigError> {
    let config = if path.exists() {
        SwitchboardConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        SwitchboardConfig::default()
    };
    Ok(config.with_env_overrides())
}
