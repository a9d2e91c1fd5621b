//! Decode → resize → background glue and JPEG encoding.
//!
//! Pure and stateless; the run engine calls these around the step loop.

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::PipelineError;

/// Longest-side bound applied to every input before fitting begins.
/// Bounds per-step optimizer cost regardless of upload resolution.
pub const MAX_DIMENSION: u32 = 256;

/// A decoded input ready for approximation: the working-size target and
/// the mean color used as the bare starting canvas.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub target: RgbaImage,
    pub background: Rgba<u8>,
}

/// Decode and downscale uploaded bytes, and compute the background fill.
///
/// Inputs already within the bound keep their native size; nothing is
/// ever upscaled.
pub fn prepare(input: &[u8]) -> Result<PreparedInput, PipelineError> {
    let decoded = image::load_from_memory(input).map_err(PipelineError::Decode)?;
    let target = downscale(decoded).to_rgba8();
    let background = average_color(&target);
    Ok(PreparedInput { target, background })
}

fn downscale(img: DynamicImage) -> DynamicImage {
    if img.width() <= MAX_DIMENSION && img.height() <= MAX_DIMENSION {
        return img;
    }
    // Triangle = bilinear; `resize` keeps the aspect ratio within the bound.
    img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
}

/// Arithmetic mean of the RGB channels across the whole image.
pub fn average_color(img: &RgbaImage) -> Rgba<u8> {
    let mut sums = [0u64; 3];
    for px in img.pixels() {
        sums[0] += px[0] as u64;
        sums[1] += px[1] as u64;
        sums[2] += px[2] as u64;
    }
    let n = (u64::from(img.width()) * u64::from(img.height())).max(1);
    Rgba([
        (sums[0] / n) as u8,
        (sums[1] / n) as u8,
        (sums[2] / n) as u8,
        255,
    ])
}

/// Encode a canvas to JPEG at the given 0-100 quality.
pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(PipelineError::Encode)?;
    Ok(out)
}
