//! fsjson CLI
//!
//! Converts datastore export logs to JSON.
//!
//! # Commands
//!
//! - `convert` - Export every log in a directory to JSON documents
//! - `verify` - Read logs and report recovered corruption
//! - `dump` - List the logical records of a log

mod commands;

use clap::{Parser, Subcommand};
use commands::convert::ConvertOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Datastore export log to JSON converter.
#[derive(Parser)]
#[command(name = "fsjson")]
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
    /// Convert every log file in a directory to JSON
    Convert {
        /// Directory containing the export files
        source_dir: PathBuf,

        /// Destination directory for the JSON files (default: <source_dir>/json)
        dest_dir: Option<PathBuf>,

        /// Number of worker threads (default: CPU count - 1)
        #[arg(short = 'P', long)]
        processes: Option<usize>,

        /// Remove all json files from the destination first
        #[arg(short = 'C', long)]
        clean_dest: bool,

        /// Skip checksum verification
        #[arg(long)]
        skip_crc: bool,

        /// Only convert files whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Read logs and report recovered corruption
    Verify {
        /// Log files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Skip checksum verification
        #[arg(long)]
        skip_crc: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the logical records of a log
    Dump {
        /// Log file to read
        file: PathBuf,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip checksum verification
        #[arg(long)]
        skip_crc: bool,

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
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Convert {
            source_dir,
            dest_dir,
            processes,
            clean_dest,
            skip_crc,
            prefix,
        } => {
            commands::convert::run(&ConvertOptions {
                source_dir,
                dest_dir,
                workers: processes,
                clean_dest,
                skip_crc,
                prefix,
            })?;
        }
        Commands::Verify {
            files,
            skip_crc,
            format,
        } => {
            commands::verify::run(&files, skip_crc, &format)?;
        }
        Commands::Dump {
            file,
            limit,
            skip_crc,
            format,
        } => {
            commands::dump::run(&file, limit, skip_crc, &format)?;
        }
        Commands::Version => {
            println!("fsjson CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("fsjson Core v{}", fsjson_core::VERSION);
        }
    }

    Ok(())
}
