//! # nightfall-lut
//!
//! 3D LUT color grading for the day/night cycle.
//!
//! Loads `.cube` and `.3dl` color-transform files into an immutable
//! [`Lattice`] and applies it to RGBA8 pixel buffers with tetrahedral
//! interpolation, turning daylight renders into sunset or night shots.
//!
//! # Pipeline
//!
//! 1. Load once: [`read_lookup_table`], [`parse_lookup_table`] or a
//!    shared [`LutCache`]
//! 2. Grade many: [`apply_lookup_table`] per image or frame
//!
//! Lattices are read-only after loading, so one instance can serve any
//! number of concurrent transforms.
//!
//! # Usage
//!
//! ```rust
//! use nightfall_lut::{apply_lookup_table, parse_lookup_table, LutFormat};
//!
//! let mut text = String::from("\n\n0 1023\n");
//! for n in 0..8 {
//!     let v = if n == 7 { 4095 } else { 0 };
//!     text.push_str(&format!("{v} {v} {v}\n"));
//! }
//! let night = parse_lookup_table(&text, LutFormat::ThreeDl).unwrap();
//!
//! let graded = apply_lookup_table(&night, &[255, 255, 255, 0]).unwrap();
//! assert_eq!(graded, vec![255, 255, 255, 255]);
//! ```
//!
//! # Formats
//!
//! - `.cube` - Adobe/Resolve, values in `[0, 1]` ([`cube`] module)
//! - `.3dl` - Lustre/Flame, integer values with breakpoints ([`threedl`] module)
//!
//! Both are read with a strict fixed-offset layout by default; see
//! [`LayoutParser`] for the tolerant alternative.
//!
//! # Dependencies
//!
//! - [`thiserror`] - Error handling
//! - [`rayon`] - Parallel pixel grading
//! - [`serde`] - Lattice hand-off across worker boundaries
//! - [`tracing`] - Load and transform events

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cube;
pub mod threedl;

mod cache;
mod engine;
mod error;
mod format;
mod lattice;
mod layout;

pub use cache::{CacheStats, LoadFn, LutCache};
pub use cube::{write_cube, write_cube_to};
pub use engine::{
    CubeSampling, TransformOptions, apply_lookup_table, apply_lookup_table_with,
    breakpoint_coordinate,
};
pub use error::{LutError, LutResult};
pub use format::LutFormat;
pub use lattice::{Lattice, LatticeKind};
pub use layout::{
    FixedLayout, KeywordLayout, LayoutParser, parse_lookup_table, read_lookup_table,
    read_lookup_table_with,
};
pub use threedl::{write_3dl, write_3dl_to};
