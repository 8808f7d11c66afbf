//! RGBA8 color transform through a [`Lattice`].
//!
//! Each pixel's R, G and B bytes are mapped to continuous grid coordinates,
//! sampled with tetrahedral interpolation and written back as bytes. Alpha
//! is not propagated: every output pixel is fully opaque.
//!
//! Coordinates depend only on the channel byte, so they are precomputed
//! into a 256-entry table once per call. Pixels are then graded in parallel
//! with Rayon.
//!
//! # Example
//!
//! ```rust
//! use nightfall_lut::{apply_lookup_table, Lattice};
//!
//! let lut = Lattice::identity_cube(17).unwrap();
//! let out = apply_lookup_table(&lut, &[10, 20, 30, 0]).unwrap();
//! assert_eq!(out[3], 255);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Lattice, LatticeKind, LutError, LutResult};

/// Pixels handed to each Rayon task.
const PIXELS_PER_TASK: usize = 4096;

/// How 8-bit channels map onto a CUBE lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CubeSampling {
    /// `channel / D`, the mapping the game's grades were tuned against.
    #[default]
    Legacy,
    /// `channel / 255 * (D - 1)`, the conventional CUBE sampling.
    Normalized,
}

/// Options for [`apply_lookup_table_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Coordinate mapping for CUBE lattices. Ignored for 3DL.
    pub cube_sampling: CubeSampling,
    /// Split the buffer across the Rayon pool.
    pub parallel: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            cube_sampling: CubeSampling::Legacy,
            parallel: true,
        }
    }
}

impl TransformOptions {
    /// Sets the CUBE coordinate mapping.
    pub fn with_sampling(mut self, sampling: CubeSampling) -> Self {
        self.cube_sampling = sampling;
        self
    }

    /// Runs on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Maps a value onto a non-uniform breakpoint axis.
///
/// Returns `i + t` where `indices[i] <= value < indices[i + 1]` and `t` is
/// the linear position between the two. Values at or past the last
/// breakpoint return `len - 1`; values below the first return 0.
///
/// # Example
///
/// ```rust
/// use nightfall_lut::breakpoint_coordinate;
///
/// let indices = [0.0, 256.0, 512.0, 768.0, 1023.0];
/// assert_eq!(breakpoint_coordinate(&indices, 512.0), 2.0);
/// assert_eq!(breakpoint_coordinate(&indices, 640.0), 2.5);
/// ```
pub fn breakpoint_coordinate(indices: &[f64], value: f64) -> f64 {
    let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
        return 0.0;
    };
    if value.is_nan() || value <= first {
        return 0.0;
    }
    if value >= last {
        return (indices.len() - 1) as f64;
    }
    // first < value < last, so 1 <= upper <= len - 1
    let upper = indices.partition_point(|&b| b <= value);
    let lower = upper - 1;
    lower as f64 + (value - indices[lower]) / (indices[upper] - indices[lower])
}

/// 3DL input rescale: 8-bit channel to the 10-bit breakpoint domain.
#[inline]
fn to_10bit(channel: u8) -> f64 {
    (channel as f64 + 1.0) * 4.0 - 1.0
}

#[inline]
fn encode_cube(value: f64) -> u8 {
    // float -> int casts saturate
    value.round() as u8
}

#[inline]
fn encode_3dl(value: f64) -> u8 {
    ((value + 1.0) / 16.0 - 1.0).round() as u8
}

impl Lattice {
    /// Continuous grid coordinate for one channel byte.
    pub fn channel_coordinate(&self, channel: u8, sampling: CubeSampling) -> f64 {
        match self.kind() {
            LatticeKind::Cube => match sampling {
                CubeSampling::Legacy => channel as f64 / self.size() as f64,
                CubeSampling::Normalized => {
                    channel as f64 / 255.0 * (self.size() - 1) as f64
                }
            },
            LatticeKind::ThreeDl { indices } => breakpoint_coordinate(indices, to_10bit(channel)),
        }
    }

    /// Grades a single RGB triple.
    pub fn sample(&self, rgb: [u8; 3], sampling: CubeSampling) -> [u8; 3] {
        let coord = rgb.map(|c| self.channel_coordinate(c, sampling));
        let encode = self.encoder();
        self.interpolate(coord).map(encode)
    }

    fn coordinate_table(&self, sampling: CubeSampling) -> [f64; 256] {
        std::array::from_fn(|c| self.channel_coordinate(c as u8, sampling))
    }

    fn encoder(&self) -> fn(f64) -> u8 {
        match self.kind() {
            LatticeKind::Cube => encode_cube,
            LatticeKind::ThreeDl { .. } => encode_3dl,
        }
    }
}

/// Applies a lattice to an RGBA8 buffer with default options.
///
/// Returns a new buffer of the same length; the input is left untouched.
/// Output alpha is always 255.
///
/// # Errors
///
/// [`LutError::InvalidBuffer`] if the length is not a multiple of 4.
pub fn apply_lookup_table(lattice: &Lattice, pixels: &[u8]) -> LutResult<Vec<u8>> {
    apply_lookup_table_with(lattice, pixels, &TransformOptions::default())
}

/// Applies a lattice to an RGBA8 buffer.
pub fn apply_lookup_table_with(
    lattice: &Lattice,
    pixels: &[u8],
    options: &TransformOptions,
) -> LutResult<Vec<u8>> {
    if pixels.len() % 4 != 0 {
        return Err(LutError::InvalidBuffer { len: pixels.len() });
    }
    trace!(
        pixels = pixels.len() / 4,
        format = %lattice.format(),
        size = lattice.size(),
        parallel = options.parallel,
        "apply_lookup_table"
    );

    let table = lattice.coordinate_table(options.cube_sampling);
    let encode = lattice.encoder();
    let mut out = vec![0u8; pixels.len()];

    let grade_span = |src: &[u8], dst: &mut [u8]| {
        for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            let rgb = lattice.interpolate([
                table[s[0] as usize],
                table[s[1] as usize],
                table[s[2] as usize],
            ]);
            d[0] = encode(rgb[0]);
            d[1] = encode(rgb[1]);
            d[2] = encode(rgb[2]);
            d[3] = 255;
        }
    };

    if options.parallel {
        let span = PIXELS_PER_TASK * 4;
        pixels
            .par_chunks(span)
            .zip(out.par_chunks_mut(span))
            .for_each(|(src, dst)| grade_span(src, dst));
    } else {
        grade_span(pixels, &mut out);
    }

    Ok(out)
}
