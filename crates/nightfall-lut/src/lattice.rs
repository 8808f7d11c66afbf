//! Dense 3D color lattice.
//!
//! A lattice maps quantized RGB input to an output color through a cube of
//! `size^3` points. It is built once by the loader and never mutated
//! afterwards, so one instance can be shared by any number of transforms.

use serde::{Deserialize, Serialize};

use crate::{LutError, LutFormat, LutResult};

/// Format-specific part of a lattice.
///
/// CUBE lattices are uniformly spaced in input space. 3DL lattices carry
/// their own input breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LatticeKind {
    /// Values pre-scaled to the 0-255 range.
    Cube,
    /// Values in the native 3DL range (typically 0-4095).
    ThreeDl {
        /// Input-domain breakpoints, strictly ascending, one per grid step.
        indices: Vec<f64>,
    },
}

impl LatticeKind {
    /// File format this kind was loaded from.
    pub fn format(&self) -> LutFormat {
        match self {
            Self::Cube => LutFormat::Cube,
            Self::ThreeDl { .. } => LutFormat::ThreeDl,
        }
    }
}

/// A cubic grid of output colors.
///
/// # Structure
///
/// - `size^3` entries, each an `[r, g, b]` output triple
/// - Stored `[r][g][b]`: blue varies fastest in memory
/// - Sampled with tetrahedral interpolation
///
/// # Example
///
/// ```rust
/// use nightfall_lut::Lattice;
///
/// let lut = Lattice::identity_cube(17).unwrap();
/// assert_eq!(lut.size(), 17);
/// assert_eq!(lut.get(16, 0, 0), [255.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatticeParts", into = "LatticeParts")]
pub struct Lattice {
    size: usize,
    data: Vec<[f64; 3]>,
    kind: LatticeKind,
}

/// Wire shape of a lattice. Deserialization re-runs the constructor checks.
#[derive(Serialize, Deserialize)]
struct LatticeParts {
    size: usize,
    data: Vec<[f64; 3]>,
    kind: LatticeKind,
}

impl TryFrom<LatticeParts> for Lattice {
    type Error = LutError;

    fn try_from(parts: LatticeParts) -> LutResult<Self> {
        Lattice::new(parts.size, parts.data, parts.kind)
    }
}

impl From<Lattice> for LatticeParts {
    fn from(lattice: Lattice) -> Self {
        Self {
            size: lattice.size,
            data: lattice.data,
            kind: lattice.kind,
        }
    }
}

impl Lattice {
    /// Creates a lattice from data already in `[r][g][b]` memory order.
    ///
    /// Fails unless `size >= 2`, there are exactly `size^3` finite entries,
    /// and (for 3DL) there are `size` strictly ascending breakpoints.
    pub fn new(size: usize, data: Vec<[f64; 3]>, kind: LatticeKind) -> LutResult<Self> {
        let expected = entry_count(size)?;
        if data.len() != expected {
            return Err(LutError::InvalidSize(format!(
                "expected {} entries for size {}, got {}",
                expected,
                size,
                data.len()
            )));
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(LutError::InvalidSize("lattice contains non-finite values".into()));
        }
        if let LatticeKind::ThreeDl { indices } = &kind {
            if indices.len() != size {
                return Err(LutError::InvalidSize(format!(
                    "expected {} breakpoints, got {}",
                    size,
                    indices.len()
                )));
            }
            if indices.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(LutError::InvalidSize(
                    "breakpoints must be strictly ascending".into(),
                ));
            }
        }
        Ok(Self { size, data, kind })
    }

    /// Builds a lattice by evaluating `f(r, g, b)` at every grid point.
    pub fn from_fn<F>(size: usize, kind: LatticeKind, f: F) -> LutResult<Self>
    where
        F: Fn(usize, usize, usize) -> [f64; 3],
    {
        let mut data = Vec::with_capacity(entry_count(size)?);
        for r in 0..size {
            for g in 0..size {
                for b in 0..size {
                    data.push(f(r, g, b));
                }
            }
        }
        Self::new(size, data, kind)
    }

    /// Creates a CUBE lattice whose points sit on the uniform 0-255 grid.
    ///
    /// Sampled with [`CubeSampling::Normalized`](crate::CubeSampling) this
    /// reproduces its input within rounding.
    pub fn identity_cube(size: usize) -> LutResult<Self> {
        let step = 255.0 / size.saturating_sub(1).max(1) as f64;
        Self::from_fn(size, LatticeKind::Cube, |r, g, b| {
            [r as f64 * step, g as f64 * step, b as f64 * step]
        })
    }

    /// Grid side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Format-specific data.
    #[inline]
    pub fn kind(&self) -> &LatticeKind {
        &self.kind
    }

    /// Format the lattice was loaded from.
    #[inline]
    pub fn format(&self) -> LutFormat {
        self.kind.format()
    }

    /// 3DL breakpoints, if any.
    pub fn indices(&self) -> Option<&[f64]> {
        match &self.kind {
            LatticeKind::ThreeDl { indices } => Some(indices),
            LatticeKind::Cube => None,
        }
    }

    /// Raw entries in `[r][g][b]` order.
    #[inline]
    pub fn data(&self) -> &[[f64; 3]] {
        &self.data
    }

    /// Smallest and largest channel value stored in the grid.
    pub fn value_range(&self) -> (f64, f64) {
        self.data
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    #[inline]
    fn index(&self, r: usize, g: usize, b: usize) -> usize {
        b + self.size * (g + self.size * r)
    }

    /// Value at grid position `(r, g, b)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is `>= size`.
    #[inline]
    pub fn get(&self, r: usize, g: usize, b: usize) -> [f64; 3] {
        self.data[self.index(r, g, b)]
    }

    /// Tetrahedral interpolation at continuous grid coordinates.
    ///
    /// Coordinates are clamped to `[0, size - 1]`. The enclosing cell is
    /// split into six tetrahedra by the ordering of the fractional parts;
    /// each shares the black `(floor, floor, floor)` and white
    /// `(up, up, up)` corners, so the result is continuous across ties.
    pub fn interpolate(&self, coord: [f64; 3]) -> [f64; 3] {
        let last = self.size - 1;
        let max = last as f64;
        let [r, g, b] = coord.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, max) });

        let r0 = r.floor() as usize;
        let g0 = g.floor() as usize;
        let b0 = b.floor() as usize;
        let r1 = (r0 + 1).min(last);
        let g1 = (g0 + 1).min(last);
        let b1 = (b0 + 1).min(last);

        let fr = r - r0 as f64;
        let fg = g - g0 as f64;
        let fb = b - b0 as f64;

        let black = self.get(r0, g0, b0);
        let white = self.get(r1, g1, b1);

        // Two inner corners along the dominant -> secondary path, and the
        // fractions sorted largest first.
        let (first, second, [w1, w2, w3]) = if fr > fg {
            if fg > fb {
                // r > g > b
                (self.get(r1, g0, b0), self.get(r1, g1, b0), [fr, fg, fb])
            } else if fr > fb {
                // r > b > g
                (self.get(r1, g0, b0), self.get(r1, g0, b1), [fr, fb, fg])
            } else {
                // b > r > g
                (self.get(r0, g0, b1), self.get(r1, g0, b1), [fb, fr, fg])
            }
        } else if fb > fg {
            // b > g > r
            (self.get(r0, g0, b1), self.get(r0, g1, b1), [fb, fg, fr])
        } else if fb > fr {
            // g > b > r
            (self.get(r0, g1, b0), self.get(r0, g1, b1), [fg, fb, fr])
        } else {
            // g > r > b
            (self.get(r0, g1, b0), self.get(r1, g1, b0), [fg, fr, fb])
        };

        std::array::from_fn(|i| {
            black[i]
                + (first[i] - black[i]) * w1
                + (second[i] - first[i]) * w2
                + (white[i] - second[i]) * w3
        })
    }
}

/// `size^3`, rejecting dimensions that are too small or cannot be allocated.
fn entry_count(size: usize) -> LutResult<usize> {
    if size < 2 {
        return Err(LutError::InvalidSize(format!(
            "dimension must be at least 2, got {}",
            size
        )));
    }
    size.checked_pow(3)
        .filter(|&n| {
            n.checked_mul(std::mem::size_of::<[f64; 3]>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or_else(|| LutError::InvalidSize(format!("dimension {} overflows", size)))
}
