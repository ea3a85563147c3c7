//! satprobe -- content credential and LDAP auth source scenario runner.
//!
//! ```text
//! satprobe list --tier 1
//! satprobe run --filter delete_key --seed 42
//! satprobe config show server
//! ```

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;

use satprobe_core::config::{GeneralConfig, SatprobeConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let general = logging_config(&cli.config, cli.log_level.as_deref()).await;
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("warning: {e}");
    }

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::List(args) => commands::list::execute(args, &writer),
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// `[general]` from the config file, or defaults when it cannot be loaded.
///
/// Load errors are reported by the command itself.
async fn logging_config(path: &Path, level_override: Option<&str>) -> GeneralConfig {
    let mut general = match SatprobeConfig::load(path).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig::default(),
    };
    if let Some(level) = level_override {
        general.log_level = level.to_owned();
    }
    general
}

fn report_error(err: &CliError) {
    use colored::Colorize;

    eprintln!("{} {}", "error:".red().bold(), err);
}
