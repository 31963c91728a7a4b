//! QuantStore CLI
//!
//! Command-line tools for exercising QuantStore storages.
//!
//! # Commands
//!
//! - `simulate` - Run a JSON operation script against a storage
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// QuantStore command-line tools.
#[derive(Parser)]
#[command(name = "quantstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON operation script and report every step
    Simulate {
        /// Path to the script
        script: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate { script, format } => {
            commands::simulate::run(&script, &format)?;
        }
        Commands::Version => {
            println!("QuantStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("QuantStore Core v{}", quantstore_core::VERSION);
        }
    }

    Ok(())
}
