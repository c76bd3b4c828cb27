use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loudmatch::analyzer;
use loudmatch::batch::BatchDriver;
use loudmatch::config::{self, MatchConfig};
use loudmatch::format;
use loudmatch::inventory;
use loudmatch::models::{BatchSummary, PairStatus};
use loudmatch::processor::FfmpegProcessor;
use loudmatch::report;

#[derive(Parser)]
#[command(
    name = "loudmatch",
    about = "Match the loudness of dubbed audio files to their source-language counterparts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every target file in a directory to its source file
    Match(MatchArgs),
    /// Print the RMS and peak level of a single file
    Measure {
        /// Audio file to measure
        path: PathBuf,

        /// Output as JSON instead of table
        #[arg(long)]
        json: bool,
    },
    /// List audio files with duration, bit depth, and sample rate
    Inventory {
        /// Directory to scan recursively
        path: PathBuf,

        /// Write the listing to this file (.csv, .json, or .txt)
        #[arg(long)]
        report: Option<PathBuf>,

        #[arg(long, default_value = config::DEFAULT_SOURCE_SUFFIX)]
        source_suffix: String,

        #[arg(long, default_value = config::DEFAULT_TARGET_SUFFIX)]
        target_suffix: String,

        /// Output as JSON instead of table
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Directory holding the source-language files
    #[arg(long)]
    source_dir: PathBuf,

    /// Directory holding the target-language files to adjust
    #[arg(long)]
    target_dir: PathBuf,

    /// Directory the adjusted files are written to
    #[arg(long)]
    output_dir: PathBuf,

    /// Filename suffix identifying source files
    #[arg(long, default_value = config::DEFAULT_SOURCE_SUFFIX)]
    source_suffix: String,

    /// Filename suffix identifying target files
    #[arg(long, default_value = config::DEFAULT_TARGET_SUFFIX)]
    target_suffix: String,

    /// Maximum RMS difference in dB left unprocessed
    #[arg(long, default_value_t = config::DEFAULT_TOLERANCE_DB, allow_negative_numbers = true)]
    tolerance: f64,

    /// Limiter ceiling in dBFS (-36.12 to 0)
    #[arg(long, default_value_t = config::DEFAULT_PEAK_LIMIT_DB, allow_negative_numbers = true)]
    peak_limit: f64,

    /// Report path (.csv, .json, or .txt); defaults to <output-dir>/loudness_report.csv
    #[arg(long)]
    report: Option<PathBuf>,

    /// Also match files in subdirectories of the target directory
    #[arg(short, long)]
    recursive: bool,

    /// ffmpeg binary used for dynamics processing
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Seconds before an ffmpeg run is abandoned (0 disables the limit)
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Print the report as JSON instead of table
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loudmatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

fn print_summary(summary: &BatchSummary, elapsed: Duration) {
    for outcome in &summary.outcomes {
        match &outcome.status {
            PairStatus::Failed(reason) => {
                eprintln!("  Failed: {}: {}", outcome.pair.file_name(), reason);
            }
            PairStatus::SkippedMissingPair => {
                eprintln!("  Missing pair: {}", outcome.pair.file_name());
            }
            _ => {}
        }
    }

    eprintln!(
        "Done: {} processed, {} bypassed, {} passthrough, {} skipped, {} failed (out of {} total) in {:.2}s",
        summary.processed(),
        summary.bypassed(),
        summary.passthrough(),
        summary.skipped(),
        summary.failed(),
        summary.total(),
        elapsed.as_secs_f64(),
    );
}

fn run_match(args: MatchArgs) -> Result<()> {
    let mut config = MatchConfig::new(args.source_dir, args.target_dir, args.output_dir);
    config.source_suffix = args.source_suffix;
    config.target_suffix = args.target_suffix;
    config.tolerance_db = args.tolerance;
    config.peak_limit_db = args.peak_limit;
    config.recursive = args.recursive;

    let report_path = args
        .report
        .unwrap_or_else(|| config.default_report_path());
    let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
    let processor = FfmpegProcessor::new(args.ffmpeg, timeout);

    let driver = BatchDriver::new(config, processor).context("Invalid configuration")?;

    let start = Instant::now();
    let summary = driver.run();
    let rows = report::compile(&summary.produced_pairs());

    report::save_report(&report_path, &rows)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
    tracing::info!(path = %report_path.display(), rows = rows.len(), "Report written");

    if args.json {
        println!("{}", format::format_json(&rows));
    } else {
        println!("{}", format::format_table(&rows));
    }

    print_summary(&summary, start.elapsed());
    Ok(())
}

fn run_measure(path: &Path, json: bool) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("Path '{}' is not a file", path.display());
    }
    let measurement = analyzer::measure(path)?;
    if json {
        println!("{}", format::format_json_single(&measurement));
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        println!("{}", format::format_measurement(&name, &measurement));
    }
    Ok(())
}

fn run_inventory(
    path: &Path,
    report_path: Option<&Path>,
    source_suffix: &str,
    target_suffix: &str,
    json: bool,
) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Path '{}' is not a directory", path.display());
    }

    let entries = inventory::scan(path, source_suffix, target_suffix);
    if entries.is_empty() {
        anyhow::bail!("No audio files found in {}", path.display());
    }

    if let Some(report_path) = report_path {
        report::save_inventory(report_path, &entries)
            .with_context(|| format!("Failed to write inventory: {}", report_path.display()))?;
        eprintln!("Inventory saved to {}", report_path.display());
    }

    if json {
        println!("{}", format::format_inventory_json(&entries));
    } else {
        println!("{}", format::format_inventory_table(&entries));
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Match(args) => run_match(args),
        Commands::Measure { path, json } => run_measure(&path, json),
        Commands::Inventory {
            path,
            report,
            source_suffix,
            target_suffix,
            json,
        } => run_inventory(&path, report.as_deref(), &source_suffix, &target_suffix, json),
    }
}
