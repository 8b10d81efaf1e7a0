//! lytro-merge CLI
//!
//! Merges all photos of a given Lytro library into the user's main
//! library, the one the Lytro desktop application uses.

mod error;
mod paths;
mod progress;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use lytro_merge_db::open_libraries;
use lytro_merge_import::{MergeStats, run_merge};

use crate::error::CliError;
use crate::progress::BarProgress;

#[derive(Parser)]
#[command(name = "lytro-merge")]
#[command(about = "Merge a Lytro photo library into your main library", long_about = None)]
struct Cli {
    /// Path to the importing library (prompted for when omitted)
    #[arg(value_name = "IMPORTING_LIBRARY")]
    importing_library: Option<PathBuf>,

    /// Path to the main library (defaults to the platform's Lytro location)
    #[arg(long, value_name = "PATH")]
    main_library: Option<PathBuf>,

    /// Enable debug mode (debug-level messages with timestamps)
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose mode (timestamps on normal output)
    #[arg(short, long)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        log::debug!("{:?}", e);
        log::error!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let main_dir = match &cli.main_library {
        Some(path) => path.clone(),
        None => paths::default_main_library()?,
    };
    let importing_dir = match &cli.importing_library {
        Some(path) => path.clone(),
        None => paths::prompt_for_library()?,
    };

    log::info!("Main library:      {}", main_dir.display());
    log::info!("Importing library: {}", importing_dir.display());
    log::warn!(
        "{}",
        "Back up your Lytro library before merging!"
            .if_supports_color(Stdout, |text| text.bold())
    );

    log::info!("(0/4) Checking libraries...");
    let mut libs = open_libraries(&importing_dir, &main_dir)?;

    let progress = BarProgress::new(cli.quiet);
    let result = run_merge(&libs, &progress);
    progress.clear();

    // Close both handles whether the merge succeeded or not; a failed run
    // abandons the destination transaction uncommitted.
    libs.close();

    let stats = result?;
    report(&stats);
    Ok(())
}

fn report(stats: &MergeStats) {
    log::info!("(4/4) Import completed. Enjoy!");
    log::info!(
        "    {} pictures merged, {} duplicates skipped, {} files copied",
        stats
            .pictures_merged
            .if_supports_color(Stdout, |count| count.green()),
        stats.duplicates_skipped,
        stats.files_copied,
    );
    if stats.empty_events_removed > 0 {
        log::info!("    {} empty events removed", stats.empty_events_removed);
    }
}

/// Map the verbosity flags onto an env_logger configuration. `RUST_LOG`
/// still wins when set.
fn init_logging(cli: &Cli) {
    let (level, timestamps) = if cli.debug {
        (LevelFilter::Debug, true)
    } else if cli.verbose {
        (LevelFilter::Info, true)
    } else if cli.quiet {
        (LevelFilter::Error, false)
    } else {
        (LevelFilter::Info, false)
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if !timestamps {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.parse_default_env();
    builder.init();
}
