mod grid;
mod info;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::Result;
use aurora::{DayWalk, Satellite};
use chrono::NaiveDate;
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
    /// Retrieve POES records and write the hourly aurora grid.
    ///
    /// For each satellite the daily averaged files for --date and the days before it are
    /// retrieved until --wanted-files have been found or --max-attempts days have been
    /// tried. Downloaded files are kept in --cache-dir and are not downloaded again.
    ///
    /// One file per hour, 0.txt through 23.txt, is written to --output.
    Grid {
        /// Directory containing previously downloaded files.
        #[arg(short, long, default_value = "poes", value_name = "path")]
        cache_dir: PathBuf,

        /// Directory to write hour files to.
        #[arg(short, long, default_value = ".", value_name = "path")]
        output: PathBuf,

        /// Most recent day to retrieve (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(short, long, value_name = "date")]
        date: Option<NaiveDate>,

        /// Only use files already in --cache-dir.
        #[arg(long, action)]
        offline: bool,

        /// Archive URL the satellite file names are appended to.
        #[arg(
            long,
            default_value = aurora::HttpRetriever::DEFAULT_BASE_URL,
            value_name = "url"
        )]
        base_url: String,

        /// Number of daily files wanted for each satellite.
        #[arg(long, default_value_t = DayWalk::DEFAULT_WANTED)]
        wanted_files: usize,

        /// Maximum number of days to try for each satellite.
        #[arg(long, default_value_t = DayWalk::DEFAULT_MAX_ATTEMPTS)]
        max_attempts: usize,

        /// Number of worker threads. 0 uses one per CPU.
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,

        /// Overwrite existing hour files.
        #[arg(long, action)]
        clobber: bool,
    },
    /// Show records and passes from local record files.
    Info {
        /// Satellite the records are from, e.g., noaa19 or n19.
        #[arg(short, long)]
        satellite: Satellite,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        /// Daily averaged record files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
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
            EnvFilter::try_from_env("AURORA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Grid {
            cache_dir,
            output,
            date,
            offline,
            base_url,
            wanted_files,
            max_attempts,
            threads,
            clobber,
        } => grid::grid(&grid::Opts {
            cache_dir: cache_dir.clone(),
            output: output.clone(),
            date: *date,
            offline: *offline,
            base_url: base_url.clone(),
            wanted_files: *wanted_files,
            max_attempts: *max_attempts,
            threads: *threads,
            clobber: *clobber,
        }),
        Commands::Info {
            satellite,
            format,
            inputs,
        } => info::info(*satellite, inputs, format),
    }
}
