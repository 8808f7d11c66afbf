//! Adobe/Resolve .cube support.
//!
//! # Format
//!
//! ```text
//! # Created by nightfall-lut
//! TITLE "Sunset"
//!
//! #
//! # LUT size
//! LUT_3D_SIZE 17
//!
//! # Data domain
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//!
//! # LUT data points
//! 0.000000 0.000000 0.000000
//! ...
//! ```
//!
//! Values in the file are in `[0, 1]` and are multiplied by 255 on load so
//! they can be compared directly with 8-bit pixels.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::layout::{cell_count, is_skippable, parse_row, read_rows, scatter_rows};
use crate::{Lattice, LatticeKind, LutError, LutResult};

/// Line holding `LUT_3D_SIZE D` in the fixed layout.
pub const SIZE_LINE: usize = 5;

/// First data row in the fixed layout.
pub const DATA_START: usize = 12;

/// File values are scaled by this on load.
pub const VALUE_SCALE: f64 = 255.0;

/// Parses the fixed layout.
pub(crate) fn parse_fixed(text: &str) -> LutResult<Lattice> {
    let lines: Vec<&str> = text.lines().collect();

    let size_line = lines
        .get(SIZE_LINE)
        .ok_or_else(|| LutError::malformed(SIZE_LINE, "missing LUT_3D_SIZE line"))?;
    let size = parse_size(size_line, SIZE_LINE)?;
    let count = cell_count(size, SIZE_LINE)?;

    let rows = read_rows(&lines, DATA_START, count, VALUE_SCALE)?;
    Lattice::new(size, scatter_rows(size, rows), LatticeKind::Cube)
}

/// Parses by scanning for keywords.
pub(crate) fn parse_keyword(text: &str) -> LutResult<Lattice> {
    let mut size: Option<(usize, usize)> = None;
    let mut rows: Vec<[f64; 3]> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if is_skippable(line) {
            continue;
        }
        let line = line.trim();
        let keyword = line.split_whitespace().next().unwrap_or_default();

        match keyword {
            "LUT_3D_SIZE" => size = Some((parse_size(line, index)?, index)),
            "LUT_1D_SIZE" => {
                return Err(LutError::malformed(index, "expected 3D LUT, found 1D"));
            }
            "DOMAIN_MIN" | "DOMAIN_MAX" => {
                let bound = parse_row(&line[keyword.len()..], index, 1.0)?;
                let default = if keyword == "DOMAIN_MIN" { 0.0 } else { 1.0 };
                if bound.iter().any(|&v| v != default) {
                    warn!(
                        line = index,
                        ?bound,
                        "{} ignored, grid is sampled over [0, 1]",
                        keyword
                    );
                }
            }
            "LUT_3D_INPUT_RANGE" => {
                let range = parse_range(&line[keyword.len()..], index)?;
                if range != [0.0, 1.0] {
                    warn!(
                        line = index,
                        ?range,
                        "{} ignored, grid is sampled over [0, 1]",
                        keyword
                    );
                }
            }
            _ if keyword.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                debug!(line = index, keyword, "skipping CUBE keyword");
            }
            _ => rows.push(parse_row(line, index, VALUE_SCALE)?),
        }
    }

    let (size, size_index) =
        size.ok_or_else(|| LutError::malformed(0, "missing LUT_3D_SIZE"))?;
    let count = cell_count(size, size_index)?;
    if rows.len() != count {
        return Err(LutError::malformed(
            size_index,
            format!("expected {} data rows, found {}", count, rows.len()),
        ));
    }
    Lattice::new(size, scatter_rows(size, rows), LatticeKind::Cube)
}

fn parse_range(rest: &str, index: usize) -> LutResult<[f64; 2]> {
    let values: Vec<f64> = rest
        .split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| {
                LutError::malformed(index, format!("invalid input range value {:?}", token))
            })
        })
        .collect::<LutResult<_>>()?;
    match values[..] {
        [min, max] => Ok([min, max]),
        _ => Err(LutError::malformed(
            index,
            format!("expected 2 input range values, found {}", values.len()),
        )),
    }
}

fn parse_size(line: &str, index: usize) -> LutResult<usize> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("LUT_3D_SIZE") {
        return Err(LutError::malformed(
            index,
            format!("expected LUT_3D_SIZE, found {:?}", line.trim()),
        ));
    }
    let value = parts
        .next()
        .ok_or_else(|| LutError::malformed(index, "LUT_3D_SIZE has no value"))?;
    value
        .parse()
        .map_err(|_| LutError::malformed(index, format!("invalid size value {:?}", value)))
}

/// Writes a CUBE lattice in the fixed layout.
///
/// # Example
///
/// ```rust,ignore
/// let lut = Lattice::identity_cube(17)?;
/// cube::write_cube("identity.cube", &lut)?;
/// ```
pub fn write_cube<P: AsRef<Path>>(path: P, lattice: &Lattice) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_cube_to(&mut writer, lattice)?;
    writer.flush()?;
    Ok(())
}

/// Writes a CUBE lattice in the fixed layout to any writer.
pub fn write_cube_to<W: Write>(writer: &mut W, lattice: &Lattice) -> LutResult<()> {
    if !matches!(lattice.kind(), LatticeKind::Cube) {
        return Err(LutError::UnsupportedFormat(format!(
            "cannot write a {} lattice as CUBE",
            lattice.format()
        )));
    }
    let size = lattice.size();

    // Header: keep LUT_3D_SIZE on SIZE_LINE and the data on DATA_START.
    writeln!(writer, "# Created by nightfall-lut")?;
    writeln!(writer, "TITLE \"nightfall\"")?;
    writeln!(writer)?;
    writeln!(writer, "#")?;
    writeln!(writer, "# LUT size")?;
    writeln!(writer, "LUT_3D_SIZE {}", size)?;
    writeln!(writer)?;
    writeln!(writer, "# Data domain")?;
    writeln!(writer, "DOMAIN_MIN 0.0 0.0 0.0")?;
    writeln!(writer, "DOMAIN_MAX 1.0 1.0 1.0")?;
    writeln!(writer)?;
    writeln!(writer, "# LUT data points")?;

    for b in 0..size {
        for g in 0..size {
            for r in 0..size {
                let rgb = lattice.get(r, g, b);
                writeln!(
                    writer,
                    "{:.6} {:.6} {:.6}",
                    rgb[0] / VALUE_SCALE,
                    rgb[1] / VALUE_SCALE,
                    rgb[2] / VALUE_SCALE
                )?;
            }
        }
    }
    Ok(())
}
