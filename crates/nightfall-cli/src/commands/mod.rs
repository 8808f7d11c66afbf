//! CLI command implementations

pub mod apply;
pub mod batch;
pub mod convert;
pub mod info;

use anyhow::{Context, Result, bail};
use nightfall_lut::{
    CubeSampling, FixedLayout, KeywordLayout, LayoutParser, Lattice, TransformOptions,
    read_lookup_table_with,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::{GradeArgs, LoadArgs};

/// Decoded 8-bit RGBA image.
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Picks the layout parser for the load flags.
pub fn layout(tolerant: bool) -> &'static dyn LayoutParser {
    if tolerant { &KeywordLayout } else { &FixedLayout }
}

/// Load LUT from path
pub fn load_lut(path: &Path, load: LoadArgs) -> Result<Lattice> {
    read_lookup_table_with(path, layout(load.tolerant))
        .with_context(|| format!("Failed to load LUT: {}", path.display()))
}

/// Transform options for the grade flags.
pub fn transform_options(grade: GradeArgs) -> TransformOptions {
    let sampling = if grade.normalized {
        CubeSampling::Normalized
    } else {
        CubeSampling::Legacy
    };
    TransformOptions::default().with_sampling(sampling)
}

/// Load a PNG as RGBA8, expanding gray/RGB/16-bit sources.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .with_context(|| format!("Failed to decode: {}", path.display()))?;

    let buf_size = reader
        .output_buffer_size()
        .context("cannot determine output buffer size")?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .with_context(|| format!("Failed to decode: {}", path.display()))?;
    let data = &buf[..info.buffer_size()];

    let pixels: Vec<u8> = match (info.color_type, info.bit_depth) {
        (png::ColorType::Rgba, png::BitDepth::Eight) => data.to_vec(),
        (png::ColorType::Rgb, png::BitDepth::Eight) => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        (png::ColorType::Grayscale, png::BitDepth::Eight) => {
            data.iter().flat_map(|&g| [g, g, g, 255]).collect()
        }
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => data
            .chunks_exact(2)
            .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
            .collect(),
        (color_type, bit_depth) => {
            bail!("Unsupported PNG layout: {:?} {:?}", color_type, bit_depth)
        }
    };

    Ok(RgbaImage {
        width: info.width,
        height: info.height,
        pixels,
    })
}

/// Save RGBA8 pixels as PNG
pub fn save_image(path: &Path, image: &RgbaImage) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("Failed to save: {}", path.display()))?;
    writer
        .write_image_data(&image.pixels)
        .with_context(|| format!("Failed to save: {}", path.display()))?;
    writer.finish()?;
    Ok(())
}
