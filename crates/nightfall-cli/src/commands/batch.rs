//! Batch grading command

use crate::{BatchArgs, GradeArgs};
use anyhow::{Context, Result, bail};
use nightfall_lut::{LutCache, TransformOptions, apply_lookup_table_with, read_lookup_table_with};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

pub fn run(args: BatchArgs, verbose: u8) -> Result<()> {
    trace!(pattern = %args.input, luts = args.lut.len(), "batch::run");

    let files: Vec<PathBuf> = glob::glob(&args.input)?
        .filter_map(|r| r.ok())
        .collect();

    if files.is_empty() {
        bail!("No files match pattern: {}", args.input);
    }

    info!(
        files = files.len(),
        luts = args.lut.len(),
        pattern = %args.input,
        "Starting batch grading"
    );

    if verbose > 0 {
        println!("Found {} files matching '{}'", files.len(), args.input);
    }

    std::fs::create_dir_all(&args.output_dir)?;

    // Workers share one cache; each LUT is parsed by whichever job asks first.
    let tolerant = args.load.tolerant;
    let cache = LutCache::new(move |name| read_lookup_table_with(name, super::layout(tolerant)));
    let options = job_options(args.grade);

    let jobs: Vec<(&PathBuf, &PathBuf)> = files
        .iter()
        .flat_map(|file| args.lut.iter().map(move |lut| (file, lut)))
        .collect();

    let results: Vec<Result<()>> = jobs
        .par_iter()
        .map(|&(input, lut)| {
            let lut_name = lut.to_string_lossy();
            let lattice = cache
                .get(&lut_name)
                .with_context(|| format!("Failed to load LUT: {}", lut.display()))?;
            let mut image = super::load_image(input)?;
            image.pixels = apply_lookup_table_with(&lattice, &image.pixels, &options)?;
            let output = output_path(&args.output_dir, input, lut);
            super::save_image(&output, &image)?;
            debug!(input = %input.display(), output = %output.display(), "graded");
            Ok(())
        })
        .collect();

    let mut success = 0;
    let mut failed = 0;
    for r in results {
        match r {
            Ok(_) => success += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Error: {:#}", e);
            }
        }
    }

    let stats = cache.stats();
    info!(success, failed, lut_loads = stats.loads, "Batch grading complete");
    println!("Processed: {} success, {} failed", success, failed);

    if failed > 0 {
        bail!("{} jobs failed", failed);
    }

    Ok(())
}

/// Jobs already run in parallel, so each frame is graded on one thread.
fn job_options(grade: GradeArgs) -> TransformOptions {
    super::transform_options(grade).sequential()
}

/// `<dir>/<image stem>_<lut stem>.png`
fn output_path(dir: &Path, input: &Path, lut: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let look = lut.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{}_{}.png", stem, look))
}
