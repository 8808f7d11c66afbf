//! LUT application command

use crate::ApplyArgs;
use anyhow::{Context, Result};
use nightfall_lut::apply_lookup_table_with;
use std::time::Instant;
use tracing::{info, trace};

pub fn run(args: ApplyArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), lut = %args.lut.display(), "apply::run");

    let lattice = super::load_lut(&args.lut, args.load)?;
    let mut image = super::load_image(&args.input)?;

    if verbose > 0 {
        println!(
            "Applying {} LUT {} ({}^3) to {} ({}x{})",
            lattice.format(),
            args.lut.display(),
            lattice.size(),
            args.input.display(),
            image.width,
            image.height
        );
    }

    let start = Instant::now();
    let options = super::transform_options(args.grade);
    image.pixels = apply_lookup_table_with(&lattice, &image.pixels, &options)
        .with_context(|| format!("Failed to grade: {}", args.input.display()))?;
    info!(
        pixels = image.pixels.len() / 4,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "graded image"
    );

    super::save_image(&args.output, &image)?;

    if verbose > 0 {
        println!("Done.");
    }

    Ok(())
}
