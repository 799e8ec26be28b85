//! CLI module for chatroute
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `backends list` - Show configured backends and their rate budgets
//! - `insights` - Report feedback insights from the feedback database
//! - `config init` - Write an annotated configuration file
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! chatroute serve -c chatroute.toml
//! chatroute backends list --json
//! chatroute completions zsh > ~/.zfunc/_chatroute
//! ```

pub mod backends;
pub mod completions;
pub mod config;
pub mod insights;
pub mod output;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// chatroute - multi-backend chat router
#[derive(Parser, Debug)]
#[command(
    name = "chatroute",
    version,
    about = "Chat router with adaptive fallback and feedback-driven backend selection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chatroute server
    Serve(ServeArgs),
    /// Inspect configured backends
    #[command(subcommand)]
    Backends(BackendsCommands),
    /// Show feedback insights and recommendations
    Insights(InsightsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "chatroute.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "CHATROUTE_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "CHATROUTE_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CHATROUTE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override the feedback database path
    #[arg(long, env = "CHATROUTE_FEEDBACK_DB")]
    pub feedback_db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum BackendsCommands {
    /// List configured backends in fallback order
    List(BackendsListArgs),
}

#[derive(Args, Debug)]
pub struct BackendsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "chatroute.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "chatroute.toml")]
    pub config: PathBuf,

    /// Feedback database to read instead of the configured one
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "chatroute.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
