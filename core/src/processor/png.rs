use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::TranscodeError;
use crate::format::OutputFormat;
use crate::processor::{EncodeSettings, FormatEncoder};

/// Highest oxipng preset that does not switch to zopfli.
const OXIPNG_PRESET: u8 = 6;
/// imagequant speed, 1 (slowest/best) to 10 (fastest/worst).
const QUANTIZE_SPEED: i32 = 3;

pub struct PngProcessor;

impl FormatEncoder for PngProcessor {
    fn supported_formats(&self) -> &[OutputFormat] {
        &[OutputFormat::Png]
    }

    fn encode(&self, image: &RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, TranscodeError> {
        let png = match settings.quality {
            None => encode_truecolor(image)?,
            Some(quality) => quantize_png(image, quality)?,
        };
        optimize_lossless(&png)
    }
}

/// Plain 8-bit RGB PNG, handed to oxipng afterwards.
fn encode_truecolor(image: &RgbImage) -> Result<Vec<u8>, TranscodeError> {
    let mut output = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut output),
        CompressionType::Fast,
        FilterType::Adaptive,
    );
    encoder
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(|e| TranscodeError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(output)
}

/// Quantize colors with imagequant at the target quality and encode as an
/// indexed palette PNG with lodepng.
fn quantize_png(image: &RgbImage, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let pixels: Vec<imagequant::RGBA> = image
        .pixels()
        .map(|p| imagequant::RGBA::new(p[0], p[1], p[2], 255))
        .collect();

    let quantize_err = |e: imagequant::Error| TranscodeError::Encode(format!("quantization failed: {}", e));

    let mut attr = imagequant::new();
    attr.set_quality(0, quality).map_err(quantize_err)?;
    attr.set_speed(QUANTIZE_SPEED).map_err(quantize_err)?;

    let mut liq_image = attr
        .new_image_borrowed(&pixels, width, height, 0.0)
        .map_err(quantize_err)?;
    let mut quantization = attr.quantize(&mut liq_image).map_err(quantize_err)?;
    let (palette, indices) = quantization.remapped(&mut liq_image).map_err(quantize_err)?;

    let palette: Vec<lodepng::RGBA> = palette
        .iter()
        .map(|c| lodepng::RGBA { r: c.r, g: c.g, b: c.b, a: c.a })
        .collect();

    let encode_err = |e: lodepng::Error| TranscodeError::Encode(format!("Failed to encode PNG: {}", e));

    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    {
        let raw = encoder.info_raw_mut();
        raw.set_colortype(lodepng::ColorType::PALETTE);
        raw.set_bitdepth(8);
        for &color in &palette {
            raw.palette_add(color).map_err(encode_err)?;
        }
    }
    {
        let color = &mut encoder.info_png_mut().color;
        color.set_colortype(lodepng::ColorType::PALETTE);
        color.set_bitdepth(8);
        for &c in &palette {
            color.palette_add(c).map_err(encode_err)?;
        }
    }

    encoder.encode(&indices, width, height).map_err(encode_err)
}

/// Lossless DEFLATE re-compression + metadata stripping via oxipng
fn optimize_lossless(png_data: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    let mut opts = oxipng::Options::from_preset(OXIPNG_PRESET);
    opts.strip = oxipng::StripChunks::Safe;

    oxipng::optimize_from_memory(png_data, &opts)
        .map_err(|e| TranscodeError::Encode(format!("optimization failed: {}", e)))
}
