//! # Command Line Interface
//!
//! `secrets-config` flattens secret documents locally, loads a configured
//! secret once, or watches it for new versions.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ObservabilitySettings;
use crate::observability::init_logging;
use crate::processing::DEFAULT_KEY_DELIMITER;

#[derive(Parser)]
#[command(name = "secrets-config")]
#[command(about = "Turn versioned secrets into flat configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flatten a secret document from a file or stdin
    Flatten {
        /// Secret document; reads stdin when omitted
        file: Option<PathBuf>,

        /// Prefix for every key
        #[arg(long, default_value = "")]
        prefix: String,

        /// Key hierarchy delimiter
        #[arg(long, default_value = DEFAULT_KEY_DELIMITER)]
        delimiter: String,

        /// Print a JSON object instead of `key = value` lines
        #[arg(long)]
        json: bool,
    },

    /// Load the configured secret once and print its keys
    Fetch {
        /// Settings file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print values instead of redacting them
        #[arg(long)]
        show_values: bool,
    },

    /// Load the configured secret and poll for new versions until Ctrl-C
    Watch {
        /// Settings file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flatten { file, prefix, delimiter, json } => {
            initialise_logging(cli.verbose)?;
            commands::flatten(file.as_deref(), &prefix, &delimiter, json)
        }
        Commands::Fetch { config, show_values } => {
            commands::fetch(config.as_deref(), show_values, cli.verbose).await
        }
        Commands::Watch { config } => commands::watch(config.as_deref(), cli.verbose).await,
    }
}

fn initialise_logging(verbose: bool) -> anyhow::Result<()> {
    let settings = ObservabilitySettings {
        log_level: if verbose { "debug" } else { "warn" }.to_string(),
        ..Default::default()
    };
    init_logging(&settings)?;
    Ok(())
}
