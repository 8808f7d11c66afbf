//! LUT normalization command.
//!
//! Reads a LUT (tolerantly by default) and writes it back in the fixed
//! layout the game's loader expects.

use crate::{ConvertArgs, LoadArgs};
use anyhow::{Context, Result, bail};
use nightfall_lut::{LutFormat, write_3dl, write_cube};
use tracing::{info, trace};

pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "convert::run");

    let lattice = super::load_lut(&args.input, LoadArgs { tolerant: !args.strict })?;
    let target = LutFormat::from_path(&args.output)
        .with_context(|| format!("Unsupported output: {}", args.output.display()))?;

    if target != lattice.format() {
        bail!(
            "Cannot convert {} to {}: CUBE and 3DL grids use different value ranges",
            lattice.format(),
            target
        );
    }

    match target {
        LutFormat::Cube => write_cube(&args.output, &lattice),
        LutFormat::ThreeDl => write_3dl(&args.output, &lattice),
    }
    .with_context(|| format!("Failed to write: {}", args.output.display()))?;

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        format = %target,
        size = lattice.size(),
        "converted LUT"
    );

    if verbose > 0 {
        println!(
            "Wrote {} ({} {}^3)",
            args.output.display(),
            target,
            lattice.size()
        );
    }

    Ok(())
}
