//! Spanio CLI
//!
//! Command-line tools for segmented output.
//!
//! # Commands
//!
//! - `split` - Split input into size-bounded segment files
//! - `inspect` - List the segments in a directory
//! - `join` - Concatenate segments back into one stream

mod commands;

use clap::{Args, Parser, Subcommand};
use spanio_stream::{SegmentNaming, SpanConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spanio command-line segment tools.
#[derive(Parser)]
#[command(name = "spanio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Segment file naming, shared by every command.
#[derive(Args)]
struct NamingArgs {
    /// Segment file name prefix
    #[arg(long, default_value = "")]
    prefix: String,

    /// Zero-padded width of the sequence number
    #[arg(long, default_value = "8")]
    width: usize,

    /// Segment file name suffix
    #[arg(long, default_value = ".data")]
    suffix: String,
}

impl NamingArgs {
    fn naming(&self) -> SegmentNaming {
        SegmentNaming::new(self.prefix.as_str(), self.width, self.suffix.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split input into size-bounded segment files
    Split {
        /// Directory receiving the segments
        #[arg(short, long)]
        dir: PathBuf,

        /// Maximum bytes per segment
        #[arg(short, long)]
        max_bytes: u64,

        #[command(flatten)]
        naming: NamingArgs,

        /// Skip fsync when closing segments
        #[arg(long)]
        no_sync: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// List the segments in a directory
    Inspect {
        /// Segment directory
        #[arg(short, long)]
        dir: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Concatenate segments in sequence order
    Join {
        /// Segment directory
        #[arg(short, long)]
        dir: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
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
        Commands::Split {
            dir,
            max_bytes,
            naming,
            no_sync,
            format,
            input,
        } => {
            let config = SpanConfig::new()
                .max_segment_bytes(max_bytes)
                .naming(naming.naming())
                .sync_on_close(!no_sync);
            commands::split::run(&dir, &config, input.as_deref(), &format)?;
        }
        Commands::Inspect {
            dir,
            naming,
            format,
        } => {
            commands::inspect::run(&dir, &naming.naming(), &format)?;
        }
        Commands::Join {
            dir,
            naming,
            output,
        } => {
            commands::join::run(&dir, &naming.naming(), output.as_deref())?;
        }
        Commands::Version => {
            println!("Spanio CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Spanio Stream v{}", spanio_stream::VERSION);
        }
    }

    Ok(())
}
