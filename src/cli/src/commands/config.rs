//! Configuration inspection commands.
//!
//! Configuration is read from the file given with `--config` (if any) with
//! `CUTLINE__*` environment variables layered on top.

use anyhow::Result;
use clap::Subcommand;
use cutline_core::config::Config;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

pub async fn execute(cmd: ConfigCommands, config: &Config, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => match format {
            OutputFormat::Table => {
                let monitor = &config.monitor;
                output::print_header("Monitor");
                output::print_detail("process_count", &monitor.process_count.to_string());
                let source = if monitor.predicates.is_some() {
                    "configured"
                } else {
                    "default"
                };
                for binding in monitor.bindings() {
                    output::print_detail(
                        &binding.predicate.to_string(),
                        &format!("processes {} ({})", binding.pair(), source),
                    );
                }

                let logging = &config.logging;
                output::print_header("Logging");
                output::print_detail("level", &logging.level);
                output::print_detail("format", &format!("{:?}", logging.format).to_lowercase());
                for (module, level) in &logging.module_levels {
                    output::print_detail(module, level);
                }
            }
            _ => output::print_item(config, format)?,
        },
    }

    Ok(())
}
