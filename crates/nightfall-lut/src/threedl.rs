//! Autodesk Lustre/Flame .3dl support.
//!
//! # Format
//!
//! ```text
//! # Created by nightfall-lut
//! # Lattice dimension 17
//! 0 64 128 192 256 320 384 448 512 576 640 704 768 832 896 960 1023
//! 0 0 0
//! ...
//! ```
//!
//! The breakpoint line both defines the dimension (its entry count) and
//! maps 10-bit input values onto grid coordinates. Output values stay in
//! their native range (typically 12-bit) until the transform rescales them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::layout::{cell_count, is_skippable, read_rows, scatter_rows};
use crate::{Lattice, LatticeKind, LutError, LutResult};

/// Line holding the breakpoints in the fixed layout.
pub const INDEX_LINE: usize = 2;

/// First data row in the fixed layout.
pub const DATA_START: usize = 3;

/// Parses the fixed layout.
pub(crate) fn parse_fixed(text: &str) -> LutResult<Lattice> {
    let lines: Vec<&str> = text.lines().collect();

    let index_line = lines
        .get(INDEX_LINE)
        .ok_or_else(|| LutError::malformed(INDEX_LINE, "missing breakpoint line"))?;
    let indices = parse_indices(index_line, INDEX_LINE)?;
    let size = indices.len();
    let count = cell_count(size, INDEX_LINE)?;

    let rows = read_rows(&lines, DATA_START, count, 1.0)?;
    Lattice::new(size, scatter_rows(size, rows), LatticeKind::ThreeDl { indices })
}

/// Parses by skipping comments and keyword lines (`3DMESH`, `Mesh`, ...).
///
/// The first line whose tokens are all numeric holds the breakpoints.
pub(crate) fn parse_keyword(text: &str) -> LutResult<Lattice> {
    let mut numeric = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_skippable(line))
        .filter(|(_, line)| {
            line.split_whitespace()
                .next()
                .is_some_and(|t| t.parse::<f64>().is_ok())
        });

    let (index_line, line) = numeric
        .next()
        .ok_or_else(|| LutError::malformed(0, "missing breakpoint line"))?;
    let indices = parse_indices(line, index_line)?;
    let size = indices.len();
    let count = cell_count(size, index_line)?;

    let rows: Vec<&str> = numeric.map(|(_, line)| line).collect();
    if rows.len() != count {
        return Err(LutError::malformed(
            index_line,
            format!("expected {} data rows, found {}", count, rows.len()),
        ));
    }
    let rows = read_rows(&rows, 0, count, 1.0)?;
    Lattice::new(size, scatter_rows(size, rows), LatticeKind::ThreeDl { indices })
}

fn parse_indices(line: &str, index: usize) -> LutResult<Vec<f64>> {
    let indices = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    LutError::malformed(index, format!("invalid breakpoint {:?}", token))
                })
        })
        .collect::<LutResult<Vec<f64>>>()?;

    if let Some(pair) = indices.windows(2).find(|w| w[0] >= w[1]) {
        return Err(LutError::malformed(
            index,
            format!("breakpoints not ascending: {} then {}", pair[0], pair[1]),
        ));
    }
    Ok(indices)
}

/// Writes a 3DL lattice in the fixed layout.
pub fn write_3dl<P: AsRef<Path>>(path: P, lattice: &Lattice) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_3dl_to(&mut writer, lattice)?;
    writer.flush()?;
    Ok(())
}

/// Writes a 3DL lattice in the fixed layout to any writer.
pub fn write_3dl_to<W: Write>(writer: &mut W, lattice: &Lattice) -> LutResult<()> {
    let indices = lattice.indices().ok_or_else(|| {
        LutError::UnsupportedFormat(format!(
            "cannot write a {} lattice as 3DL",
            lattice.format()
        ))
    })?;
    let size = lattice.size();

    writeln!(writer, "# Created by nightfall-lut")?;
    writeln!(writer, "# Lattice dimension {}", size)?;
    let header: Vec<String> = indices.iter().map(|v| v.to_string()).collect();
    writeln!(writer, "{}", header.join(" "))?;

    for b in 0..size {
        for g in 0..size {
            for r in 0..size {
                let rgb = lattice.get(r, g, b);
                writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
            }
        }
    }
    Ok(())
}
