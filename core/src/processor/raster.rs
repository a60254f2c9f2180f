use std::io::Cursor;

use image::codecs::bmp::BmpEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::TranscodeError;
use crate::format::OutputFormat;
use crate::processor::{EncodeSettings, FormatEncoder};

/// BMP and TIFF. Neither container has a quality knob, so the encode is
/// always lossless.
pub struct RasterProcessor;

impl FormatEncoder for RasterProcessor {
    fn supported_formats(&self) -> &[OutputFormat] {
        &[OutputFormat::Bmp, OutputFormat::Tiff]
    }

    fn encode(&self, image: &RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, TranscodeError> {
        let (width, height) = image.dimensions();
        let mut output = Vec::new();

        let result = match settings.format {
            OutputFormat::Bmp => BmpEncoder::new(&mut output).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            OutputFormat::Tiff => TiffEncoder::new(Cursor::new(&mut output)).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            other => return Err(TranscodeError::UnsupportedFormat(other.as_str().to_string())),
        };

        result.map_err(|e| {
            TranscodeError::Encode(format!("Failed to encode {}: {}", settings.format.as_str(), e))
        })?;

        Ok(output)
    }
}
