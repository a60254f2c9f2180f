use std::path::PathBuf;
use thiserror::Error;

/// Failure to transcode a single image. Scoped to one file; the batch
/// driver logs it and moves on.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TranscodeError {
    /// True for errors caused by the input (unreadable, corrupt, unknown
    /// format), false for errors on the output side.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Decode { .. })
    }
}

/// Failure that aborts a whole batch before any file is touched.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("both input and output folders must be given")]
    MissingFolder,

    #[error("input folder does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("failed to create output folder {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("directory walk error: {0}")]
    Enumerate(#[from] walkdir::Error),
}
