///
/// This module implements the CLI interface for onbase-export: command parsing,
/// main entrypoints, and user-visible output.
///
/// All conversion logic lives in the library modules; this module is strictly
/// glue between arguments, the config loader and [`crate::convert`].
///
/// - For command-line users: use the installed `onbase-export` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
use crate::convert::convert;
use crate::import::SchemaPolicy;
use crate::load_config::{load_config, write_default_config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for onbase-export: turn an OnBase disk dump into files and tables.
#[derive(Parser)]
#[clap(
    name = "onbase-export",
    version,
    about = "Convert an OnBase disk dump into one file per document plus CSV/Excel metadata"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file if none exists yet
    Init {
        /// Path to the YAML config file
        #[clap(long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Import the dump, combine document files and export the metadata tables
    Convert {
        /// Path to the YAML config file
        #[clap(long, default_value = "config.yaml")]
        config: PathBuf,
        /// Log and drop unknown attributes instead of aborting the import
        #[clap(long)]
        lenient: bool,
    },
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Init { config } => {
            if write_default_config(&config)? {
                println!("Wrote default config to {}", config.display());
            } else {
                println!("Config {} already exists, left unchanged", config.display());
            }
            Ok(())
        }
        Commands::Convert { config, lenient } => {
            let mut config = load_config(config)?;
            if lenient {
                config.import.schema_policy = SchemaPolicy::Lenient;
            }
            tracing::info!(command = "convert", "Conversion starting");
            match convert(&config) {
                Ok((_, summary)) => {
                    tracing::info!(command = "convert", "Conversion complete");
                    // stdout carries only the JSON summary
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "convert", error = %e, "Conversion failed");
                    Err(anyhow::Error::new(e).context("Conversion failed"))
                }
            }
        }
    }
}
