pub mod jpg;
pub mod png;
pub mod raster;
pub mod webp;

use image::RgbImage;

use crate::config::{EncodingStrategy, LOSSLESS_LOSSY_QUALITY};
use crate::error::TranscodeError;
use crate::format::OutputFormat;

/// Resolved encoder parameters for one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub format: OutputFormat,
    /// `None` means the encode is lossless and no quality is applied.
    pub quality: Option<u8>,
    pub progressive: bool,
    pub optimize: bool,
}

impl EncodeSettings {
    /// Work out how `strategy` maps onto the container `format`.
    pub fn plan(strategy: EncodingStrategy, format: OutputFormat) -> Self {
        let quality = match strategy {
            EncodingStrategy::Lossless if format.is_lossless_native() => None,
            EncodingStrategy::Lossless if format.takes_quality() => Some(LOSSLESS_LOSSY_QUALITY),
            EncodingStrategy::Lossless => None,
            EncodingStrategy::QualityReduced(q) if format.takes_quality() => Some(q.get()),
            EncodingStrategy::QualityReduced(_) => None,
        };

        Self {
            format,
            quality,
            progressive: quality.is_some(),
            optimize: true,
        }
    }
}

/// One encoder per output container.
pub trait FormatEncoder: Send + Sync {
    fn supported_formats(&self) -> &[OutputFormat];
    fn encode(&self, image: &RgbImage, settings: &EncodeSettings) -> Result<Vec<u8>, TranscodeError>;
}
