mod dump;
mod info;
mod samples;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of a Sentinel-1 Level-0 measurement file
    Info {
        /// Input measurement data file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
    /// Write decoded packet headers as JSON, one packet per line
    Headers {
        /// Input measurement data file
        input: PathBuf,

        /// Only output this many packets
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Write reassembled ancillary data as JSON
    Ancillary {
        /// Input measurement data file
        input: PathBuf,
    },
    /// Decode echo samples and write them as a matrix of complex values.
    ///
    /// Only echoes with a known sensor position are written, i.e., those following the
    /// first complete ancillary record. Rows are zero padded to the longest echo and
    /// written row major as little-endian f64 (real, imaginary) pairs.
    Samples {
        /// Input measurement data file
        input: PathBuf,

        /// Output file path.
        #[arg(short, long, default_value = "samples.dat", value_name = "path")]
        output: PathBuf,

        /// Only decode this many packets
        #[arg(short, long)]
        limit: Option<usize>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("S1L0_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info { input, format } => info::info(input, format),
        Commands::Headers { input, limit } => dump::headers(input, *limit),
        Commands::Ancillary { input } => dump::ancillary(input),
        Commands::Samples {
            input,
            output,
            limit,
            clobber,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            samples::samples(input, output, *limit)
        }
    }
}
