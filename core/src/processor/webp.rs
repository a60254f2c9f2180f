use image::RgbImage;

use crate::error::TranscodeError;
use crate::format::OutputFormat;
use crate::processor::{EncodeSettings, FormatEncoder};

/// libwebp refuses anything larger on either axis.
const WEBP_MAX_DIMENSION: u32 = 16383;

pub struct WebpProcessor;

impl FormatEncoder for WebpProcessor {
    fn supported_formats(&self) -> &[OutputFormat] {
        &[OutputFormat::Webp]
    }

    fn encode(&self, image: &RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, TranscodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(TranscodeError::Encode(format!(
                "{width}x{height} is outside the WebP dimension limits"
            )));
        }

        let encoder = webp::Encoder::from_rgb(image.as_raw(), width, height);

        let encoded = match settings.quality {
            Some(quality) => encoder.encode(quality as f32),
            None => encoder.encode_lossless(),
        };

        Ok(encoded.to_vec())
    }
}
