//! nightfall - LUT grading CLI
//!
//! Applies sunset/night color grades to PNG renders and inspects or
//! normalizes `.cube` / `.3dl` files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nightfall")]
#[command(author, version, about = "3D LUT color grading for PNG renders")]
#[command(long_about = "
Applies .cube and .3dl color grades to RGBA images.

Examples:
  nightfall apply day.png -o dusk.png -l luts/sunset.cube
  nightfall apply day.png -o night.png -l luts/night.3dl
  nightfall info luts/sunset.cube
  nightfall convert resolve_export.cube -o sunset.cube
  nightfall batch 'renders/*.png' -O graded -l luts/sunset.cube -l luts/night.3dl
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a LUT to a PNG image
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Show LUT information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Re-emit a LUT in the strict fixed layout
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Apply one or more LUTs to many images
    Batch(BatchArgs),
}

/// Options shared by every command that loads a LUT.
#[derive(Args, Clone, Copy)]
struct LoadArgs {
    /// Scan for keywords instead of using fixed line offsets
    #[arg(long)]
    tolerant: bool,
}

/// Options shared by every command that grades pixels.
#[derive(Args, Clone, Copy)]
struct GradeArgs {
    /// Sample CUBE grids over 0..D-1 instead of the legacy channel/D mapping
    #[arg(long)]
    normalized: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// LUT file (.cube, .3dl)
    #[arg(short, long)]
    lut: PathBuf,

    #[command(flatten)]
    load: LoadArgs,

    #[command(flatten)]
    grade: GradeArgs,
}

#[derive(Args)]
struct InfoArgs {
    /// LUT file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    load: LoadArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input LUT (read with the tolerant parser unless --strict)
    input: PathBuf,

    /// Output LUT; extension must match the input format
    #[arg(short, long)]
    output: PathBuf,

    /// Read the input with fixed line offsets
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// Input glob pattern (e.g., "renders/*.png")
    input: String,

    /// Output directory
    #[arg(short = 'O', long)]
    output_dir: PathBuf,

    /// LUT file(s); each image is graded once per LUT
    #[arg(short, long, required = true)]
    lut: Vec<PathBuf>,

    #[command(flatten)]
    load: LoadArgs,

    #[command(flatten)]
    grade: GradeArgs,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, cli.verbose),
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Batch(args) => commands::batch::run(args, cli.verbose),
    }
}
