use std::path::Path;

use crate::color::ImageHandle;
use crate::config::EncodingStrategy;
use crate::error::TranscodeError;
use crate::format::OutputFormat;
use crate::io::write_atomic;
use crate::processor::jpg::JpgProcessor;
use crate::processor::png::PngProcessor;
use crate::processor::raster::RasterProcessor;
use crate::processor::webp::WebpProcessor;
use crate::processor::{EncodeSettings, FormatEncoder};

/// Registry of per-format encoders. Decodes, normalizes and re-encodes one
/// image at a time.
pub struct Transcoder {
    encoders: Vec<Box<dyn FormatEncoder>>,
}

impl Transcoder {
    pub fn new() -> Self {
        Self {
            encoders: Vec::new(),
        }
    }

    pub fn register(&mut self, encoder: Box<dyn FormatEncoder>) {
        self.encoders.push(encoder);
    }

    /// Find an encoder that supports the given format.
    fn find_encoder(&self, format: OutputFormat) -> Option<&dyn FormatEncoder> {
        self.encoders
            .iter()
            .find(|e| e.supported_formats().contains(&format))
            .map(|e| e.as_ref())
    }

    /// Re-encode `input` into `output` under `strategy`. The output container
    /// is picked from the output extension.
    pub fn transcode(
        &self,
        input: &Path,
        output: &Path,
        strategy: EncodingStrategy,
    ) -> Result<(), TranscodeError> {
        let format = OutputFormat::from_path(output).ok_or_else(|| {
            TranscodeError::UnsupportedFormat(
                output
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown".into()),
            )
        })?;

        let encoder = self
            .find_encoder(format)
            .ok_or_else(|| TranscodeError::UnsupportedFormat(format.as_str().to_string()))?;

        let handle = ImageHandle::open(input)?;
        let (width, height) = handle.dimensions();
        log::debug!(
            "{}: {}x{} {:?} -> {}",
            input.display(),
            width,
            height,
            handle.mode(),
            format.as_str()
        );

        let settings = EncodeSettings::plan(strategy, format);
        if let (EncodingStrategy::QualityReduced(q), None) = (strategy, settings.quality) {
            log::debug!("{} has no quality setting, quality {} not applied", format.as_str(), q);
        }

        let rgb = handle.into_rgb();
        let encoded = encoder.encode(&rgb, &settings)?;
        write_atomic(output, &encoded)
    }
}

impl Default for Transcoder {
    /// A transcoder with every built-in encoder registered.
    fn default() -> Self {
        let mut transcoder = Self::new();
        transcoder.register(Box::new(PngProcessor));
        transcoder.register(Box::new(JpgProcessor));
        transcoder.register(Box::new(WebpProcessor));
        transcoder.register(Box::new(RasterProcessor));
        transcoder
    }
}

/// Transcode one file with the default encoder set.
pub fn transcode(input: &Path, output: &Path, strategy: EncodingStrategy) -> Result<(), TranscodeError> {
    Transcoder::default().transcode(input, output, strategy)
}
