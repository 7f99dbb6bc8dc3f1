//! Tidemark CLI
//!
//! Command-line tools for inspecting Tidemark namespaces.
//!
//! # Commands
//!
//! - `inspect` - Display collections and journal counts
//! - `pending` - Dump a collection's pending journals as JSON
//! - `compact` - Rewrite a namespace journal to reclaim space
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tidemark_core::{Config, Database};
use tracing_subscriber::EnvFilter;

/// Tidemark command-line store tools.
#[derive(Parser)]
#[command(name = "tidemark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory holding namespace data
    #[arg(global = true, short, long, default_value = ".")]
    root: PathBuf,

    /// Namespace to operate on
    #[arg(global = true, short, long)]
    namespace: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display collections and journal counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump a collection's pending upserts and removes as JSON
    Pending {
        /// Collection whose journals to dump
        collection: String,
    },

    /// Rewrite the namespace journal down to its current state
    Compact,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("tidemark {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let namespace = cli
        .namespace
        .ok_or("--namespace is required for this command")?;

    match cli.command {
        Commands::Inspect { format } => {
            let db = open(&cli.root, &namespace).await?;
            commands::inspect::run(&db, &format).await
        }
        Commands::Pending { collection } => {
            let db = open(&cli.root, &namespace).await?;
            commands::pending::run(&db, &collection).await
        }
        Commands::Compact => commands::compact::run(&cli.root, &namespace),
        Commands::Version => unreachable!("handled above"),
    }
}

async fn open(root: &Path, namespace: &str) -> Result<Database, Box<dyn std::error::Error>> {
    Ok(Database::open_on_disk(root, Config::new(namespace)).await?)
}
