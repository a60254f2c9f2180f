use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::TranscodeError;
use crate::format::OutputFormat;
use crate::processor::{EncodeSettings, FormatEncoder};

pub struct JpgProcessor;

impl FormatEncoder for JpgProcessor {
    fn supported_formats(&self) -> &[OutputFormat] {
        &[OutputFormat::Jpeg]
    }

    fn encode(&self, image: &RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, TranscodeError> {
        let (width, height) = image.dimensions();
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(TranscodeError::Encode(format!(
                    "{width}x{height} exceeds the JPEG dimension limit"
                )))
            }
        };

        let quality = settings
            .quality
            .ok_or_else(|| TranscodeError::Encode("JPEG needs a quality".into()))?;

        let mut output = Vec::new();
        let mut encoder = Encoder::new(&mut output, quality);
        encoder.set_progressive(settings.progressive);
        encoder.set_optimized_huffman_tables(settings.optimize);

        encoder
            .encode(image.as_raw(), w, h, ColorType::Rgb)
            .map_err(|e| TranscodeError::Encode(format!("Failed to encode JPEG: {}", e)))?;

        Ok(output)
    }
}
