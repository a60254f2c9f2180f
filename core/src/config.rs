use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::BatchError;

/// Lowest quality a quality-reduced run may use.
pub const MIN_QUALITY: u8 = 10;
/// Highest quality a quality-reduced run may use.
pub const MAX_QUALITY: u8 = 95;
/// Quality used by the lossless strategy on lossy-only containers.
pub const LOSSLESS_LOSSY_QUALITY: u8 = 95;
/// Quality offered when the caller does not pick one.
pub const DEFAULT_QUALITY: u8 = 85;

/// Folder name used when no output folder is given.
pub const DEFAULT_OUTPUT_DIR: &str = "reduced_images";

/// Lossy quality, always within `MIN_QUALITY..=MAX_QUALITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(u8);

impl Quality {
    /// Clamp any integer into the accepted range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How every file of a batch is re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Keep full visual fidelity, only trim encoding overhead.
    #[default]
    Lossless,
    /// Re-encode at the given quality.
    QualityReduced(Quality),
}

impl EncodingStrategy {
    /// Build a quality-reduced strategy, clamping `quality` into range.
    pub fn quality_reduced(quality: i64) -> Self {
        Self::QualityReduced(Quality::clamped(quality))
    }
}

impl fmt::Display for EncodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lossless => write!(f, "lossless"),
            Self::QualityReduced(q) => write!(f, "quality {q}"),
        }
    }
}

/// Everything a batch run needs, supplied once per run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub strategy: EncodingStrategy,
}

impl BatchConfig {
    pub fn new(
        input_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        strategy: EncodingStrategy,
    ) -> Self {
        Self {
            input_folder: input_folder.into(),
            output_folder: output_folder.into(),
            strategy,
        }
    }

    /// Check the folder preconditions. Empty paths are rejected without
    /// touching the filesystem.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.input_folder.as_os_str().is_empty() || self.output_folder.as_os_str().is_empty() {
            return Err(BatchError::MissingFolder);
        }
        if !self.input_folder.is_dir() {
            return Err(BatchError::InputNotFound(self.input_folder.clone()));
        }
        Ok(())
    }
}

/// Output folder suggested for an input folder: `<input>/reduced_images`.
pub fn default_output_folder(input_folder: &Path) -> PathBuf {
    input_folder.join(DEFAULT_OUTPUT_DIR)
}
