//! LUT info command.
//!
//! Displays format, grid dimension, stored value range and, for 3DL, the
//! input breakpoints.

use crate::InfoArgs;
use anyhow::Result;
use nightfall_lut::Lattice;
use serde_json::json;
use std::path::Path;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for path in &args.input {
        let lattice = super::load_lut(path, args.load)?;

        if args.json {
            print_json(path, &lattice)?;
        } else {
            print_text(path, &lattice, verbose);
        }

        if args.input.len() > 1 && !args.json {
            println!();
        }
    }

    Ok(())
}

fn print_text(path: &Path, lattice: &Lattice, verbose: u8) {
    let (lo, hi) = lattice.value_range();
    println!("{}", path.display());
    println!("  Format:     {}", lattice.format());
    println!("  Dimension:  {0}x{0}x{0}", lattice.size());
    println!("  Entries:    {}", lattice.data().len());
    println!("  Values:     {:.3} .. {:.3}", lo, hi);

    if let Some(indices) = lattice.indices() {
        let shown: Vec<String> = indices.iter().map(|v| v.to_string()).collect();
        println!("  Breakpoints: {}", shown.join(" "));
    }

    if verbose > 0 {
        let last = lattice.size() - 1;
        println!("  Black ->    {:?}", lattice.get(0, 0, 0));
        println!("  White ->    {:?}", lattice.get(last, last, last));
    }
}

fn print_json(path: &Path, lattice: &Lattice) -> Result<()> {
    let (lo, hi) = lattice.value_range();
    let value = json!({
        "path": path.display().to_string(),
        "format": lattice.format().to_string(),
        "size": lattice.size(),
        "min": lo,
        "max": hi,
        "indices": lattice.indices(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
