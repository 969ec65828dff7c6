//! recordio CLI
//!
//! Command-line tools for recordio log files.
//!
//! # Commands
//!
//! - `dump` - List records with offsets and a payload preview
//! - `verify` - Scan the whole log and report its tail state
//! - `recover` - Truncate a torn or corrupt tail
//! - `append` - Append records from arguments or files

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use recordio_core::{LogConfig, DEFAULT_ALIGNMENT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// recordio log inspection and repair tools.
#[derive(Parser)]
#[command(name = "recordio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Frame alignment the log was written with
    #[arg(global = true, short, long, default_value_t = DEFAULT_ALIGNMENT)]
    alignment: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List records
    Dump {
        /// Maximum number of records to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start from this frame offset
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Verify that every byte of the log belongs to a valid frame
    Verify,

    /// Truncate trailing bytes that do not decode into frames
    Recover {
        /// Report what would be truncated without modifying the file
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Append one record per argument
    Append {
        /// Record payloads, or file paths with --file
        #[arg(required = true)]
        records: Vec<String>,

        /// Treat each argument as a file whose contents form one record
        #[arg(short, long)]
        file: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = LogConfig::new().alignment(cli.alignment);
    config.validate()?;

    match cli.command {
        Commands::Dump {
            limit,
            offset,
            format,
        } => {
            let path = cli.path.ok_or("Log path required for dump")?;
            commands::dump::run(&path, &config, offset, limit, format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Log path required for verify")?;
            commands::verify::run(&path, &config)?;
        }
        Commands::Recover { dry_run } => {
            let path = cli.path.ok_or("Log path required for recover")?;
            commands::recover::run(&path, &config, dry_run)?;
        }
        Commands::Append { records, file } => {
            let path = cli.path.ok_or("Log path required for append")?;
            commands::append::run(&path, &config, &records, file)?;
        }
        Commands::Version => {
            println!("recordio CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("recordio core v{}", recordio_core::VERSION);
        }
    }

    Ok(())
}
