//! Layout parsers: text to [`Lattice`].
//!
//! [`FixedLayout`] is the strict parser the game's LUT assets are authored
//! against: header and data lines sit at fixed line offsets and nothing is
//! scanned for. [`KeywordLayout`] is a tolerant alternative that skips
//! comments and reads keywords wherever they appear. Both produce the same
//! [`Lattice`], so the transform engine does not care which one ran.
//!
//! # Example
//!
//! ```rust
//! use nightfall_lut::{parse_lookup_table, LutFormat};
//!
//! let text = "\n\n0 512 1023\n".to_string()
//!     + &"0 0 0\n".repeat(27);
//! let lut = parse_lookup_table(&text, LutFormat::ThreeDl).unwrap();
//! assert_eq!(lut.size(), 3);
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{LutError, LutFormat, LutResult, Lattice, cube, threedl};

/// Strategy for turning LUT text into a lattice.
pub trait LayoutParser: Send + Sync {
    /// Parses the full file contents.
    fn parse(&self, text: &str, format: LutFormat) -> LutResult<Lattice>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Strict fixed-offset parser.
///
/// - CUBE: `LUT_3D_SIZE D` on line 5, data rows from line 12, values x255
/// - 3DL: breakpoints on line 2 (their count is `D`), data rows from line 3
///
/// Line numbers are 0-based. Rows are R-fastest, then G, then B. Exactly
/// `D^3` rows are read; anything after them is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLayout;

impl LayoutParser for FixedLayout {
    fn parse(&self, text: &str, format: LutFormat) -> LutResult<Lattice> {
        match format {
            LutFormat::Cube => cube::parse_fixed(text),
            LutFormat::ThreeDl => threedl::parse_fixed(text),
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Tolerant keyword-scanning parser.
///
/// Skips blank lines and `#` comments. For CUBE, `LUT_3D_SIZE` may appear on
/// any line and `TITLE`/`DOMAIN_*` are ignored. For 3DL, the first numeric
/// line holds the breakpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordLayout;

impl LayoutParser for KeywordLayout {
    fn parse(&self, text: &str, format: LutFormat) -> LutResult<Lattice> {
        match format {
            LutFormat::Cube => cube::parse_keyword(text),
            LutFormat::ThreeDl => threedl::parse_keyword(text),
        }
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Parses LUT text with the strict [`FixedLayout`].
pub fn parse_lookup_table(text: &str, format: LutFormat) -> LutResult<Lattice> {
    FixedLayout.parse(text, format)
}

/// Reads a LUT file, picking the format from its extension.
///
/// # Example
///
/// ```rust,ignore
/// let sunset = nightfall_lut::read_lookup_table("luts/sunset.cube")?;
/// ```
pub fn read_lookup_table<P: AsRef<Path>>(path: P) -> LutResult<Lattice> {
    read_lookup_table_with(path, &FixedLayout)
}

/// Reads a LUT file with an explicit layout parser.
pub fn read_lookup_table_with<P: AsRef<Path>>(
    path: P,
    parser: &dyn LayoutParser,
) -> LutResult<Lattice> {
    let path = path.as_ref();
    let format = LutFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let lattice = parser.parse(&text, format)?;
    debug!(
        path = %path.display(),
        %format,
        size = lattice.size(),
        layout = parser.name(),
        "loaded LUT"
    );
    Ok(lattice)
}

// Helpers shared by the per-format parsers

/// `D^3`, rejecting dimensions that cannot form a lattice.
pub(crate) fn cell_count(size: usize, line: usize) -> LutResult<usize> {
    if size < 2 {
        return Err(LutError::malformed(
            line,
            format!("dimension must be at least 2, got {}", size),
        ));
    }
    size.checked_pow(3)
        .ok_or_else(|| LutError::malformed(line, format!("dimension {} is too large", size)))
}

/// Parses the first three tokens of a data row, multiplied by `scale`.
pub(crate) fn parse_row(line: &str, index: usize, scale: f64) -> LutResult<[f64; 3]> {
    let mut tokens = line.split_whitespace();
    let mut out = [0.0; 3];
    for (channel, slot) in ["R", "G", "B"].iter().zip(out.iter_mut()) {
        let token = tokens.next().ok_or_else(|| {
            LutError::malformed(index, format!("expected 3 values, found {:?}", line.trim()))
        })?;
        let value: f64 = token.parse().map_err(|_| {
            LutError::malformed(index, format!("invalid {} value {:?}", channel, token))
        })?;
        if !value.is_finite() {
            return Err(LutError::malformed(
                index,
                format!("non-finite {} value {:?}", channel, token),
            ));
        }
        *slot = value * scale;
    }
    Ok(out)
}

/// Reorders rows from file order (R fastest) to memory order (B fastest).
pub(crate) fn scatter_rows(size: usize, rows: Vec<[f64; 3]>) -> Vec<[f64; 3]> {
    let mut data = vec![[0.0; 3]; rows.len()];
    for (n, rgb) in rows.into_iter().enumerate() {
        let r = n % size;
        let g = (n / size) % size;
        let b = n / (size * size);
        data[b + size * (g + size * r)] = rgb;
    }
    data
}

/// Reads exactly `count` rows starting at line `start`.
pub(crate) fn read_rows(
    lines: &[&str],
    start: usize,
    count: usize,
    scale: f64,
) -> LutResult<Vec<[f64; 3]>> {
    let available = lines.len().saturating_sub(start);
    if available < count {
        return Err(LutError::malformed(
            lines.len(),
            format!("expected {} data rows, found {}", count, available),
        ));
    }
    lines[start..start + count]
        .iter()
        .enumerate()
        .map(|(n, line)| parse_row(line, start + n, scale))
        .collect()
}

/// True for blank lines and `#` comments.
pub(crate) fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_parsing() {
        assert_eq!(parse_row(" 0.5 1 0 ", 0, 2.0).unwrap(), [1.0, 2.0, 0.0]);
        assert!(matches!(
            parse_row("0.5 1", 7, 1.0),
            Err(LutError::MalformedLut { line: 7, .. })
        ));
        assert!(parse_row("0.5 x 1", 0, 1.0).is_err());
        assert!(parse_row("0.5 inf 1", 0, 1.0).is_err());
    }

    #[test]
    fn scatter_is_r_fastest() {
        // Row n carries its own index so we can see where it lands.
        let rows: Vec<[f64; 3]> = (0..8).map(|n| [n as f64; 3]).collect();
        let data = scatter_rows(2, rows);
        // (r=1, g=0, b=0) is file row 1 and memory slot 4.
        assert_eq!(data[4], [1.0; 3]);
        // (r=0, g=1, b=0) is file row 2 and memory slot 2.
        assert_eq!(data[2], [2.0; 3]);
        // (r=0, g=0, b=1) is file row 4 and memory slot 1.
        assert_eq!(data[1], [4.0; 3]);
    }

    #[test]
    fn truncated_rows() {
        let lines = ["0 0 0", "1 1 1"];
        let err = read_rows(&lines, 0, 3, 1.0).unwrap_err();
        assert!(err.to_string().contains("expected 3 data rows, found 2"));
    }

    #[test]
    fn dimension_bounds() {
        assert!(cell_count(1, 0).is_err());
        assert!(cell_count(usize::MAX, 0).is_err());
        assert_eq!(cell_count(17, 0).unwrap(), 4913);
    }

    #[test]
    fn unsupported_extension_is_checked_first() {
        let err = read_lookup_table("does/not/exist.spi3d").unwrap_err();
        assert!(matches!(err, LutError::UnsupportedFormat(_)));
        let err = read_lookup_table("does/not/exist.cube").unwrap_err();
        assert!(matches!(err, LutError::Io(_)));
    }
}
