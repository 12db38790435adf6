//! Cube DI CLI - inspect and validate container configuration files

#![warn(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cube-di")]
#[command(about = "Inspect and validate dependency injection configuration", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration for dangling references and cycles
    Check {
        /// Path to the JSON or TOML configuration file
        file: PathBuf,
    },

    /// Print a parameter by dotted path
    Param {
        /// Path to the JSON or TOML configuration file
        file: PathBuf,

        /// Dotted parameter path, e.g. db.host
        path: String,
    },

    /// Show what a definition depends on
    Graph {
        /// Path to the JSON or TOML configuration file
        file: PathBuf,

        /// Definition id
        id: String,
    },

    /// List all definitions
    List {
        /// Path to the JSON or TOML configuration file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --debug only changes the fallback
    let fallback = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { file } => commands::check::run(&file),
        Commands::Param { file, path } => commands::param::run(&file, &path),
        Commands::Graph { file, id } => commands::graph::run(&file, &id),
        Commands::List { file } => commands::list::run(&file),
    }
}
