//! Cutline CLI - replay recorded traces through the global-predicate monitor.
//!
//! Provides detection, lattice inspection, and configuration commands.

mod commands;
mod output;
mod predicates;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cutline_core::config::Config;
use cutline_core::telemetry;

use commands::{config, detect, lattice};
use output::OutputFormat;

/// Cutline - offline detection of global predicates
#[derive(Parser)]
#[command(
    name = "cutline",
    version = "0.1.0",
    about = "Cutline - offline detection of global predicates",
    long_about = "Replays vector-clocked traces and decides whether predicates over two \
                  processes were possibly or definitely true.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Configuration file (JSON, YAML or TOML)
    #[arg(short, long, global = true, env = "CUTLINE_CONFIG")]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check predicates against a recorded trace
    Detect(detect::DetectArgs),

    /// Show the consistent states of a process pair
    Lattice(lattice::LatticeArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::from_file(path).with_context(|| format!("Failed to load config {}", path))
        }
        None => Config::load().context("Failed to load config from environment"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        cfg.logging.level = level;
    }
    telemetry::init_logging(&cfg.logging)?;

    let format = cli.output;
    match cli.command {
        Commands::Detect(args) => detect::execute(args, &cfg, format).await,
        Commands::Lattice(args) => lattice::execute(args, format).await,
        Commands::Config(cmd) => config::execute(cmd, &cfg, format).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
