//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// satprobe -- content credential and LDAP auth source scenario runner.
///
/// Use `satprobe <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "satprobe", version, about, long_about = None)]
pub struct Cli {
    /// Path to the satprobe.toml configuration file.
    #[arg(short, long, default_value = "satprobe.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in scenarios.
    List(ListArgs),

    /// Run scenarios against the configured server.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- list ----

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only scenarios whose name contains this text.
    #[arg(long)]
    pub filter: Option<String>,

    /// Only scenarios of this tier (1 or 2).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub tier: Option<u8>,
}

// ---- run ----

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only scenarios whose name contains this text.
    #[arg(long)]
    pub filter: Option<String>,

    /// Only scenarios of this tier (1 or 2).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub tier: Option<u8>,

    /// Name generation seed (overrides `[naming] seed`).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Create one organization up front and run every scenario in it.
    #[arg(long)]
    pub shared_org: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, server, ldap, ipa, fixtures, naming).
        section: Option<String>,
    },
}
