//! Batch image size reduction.
//!
//! A [`Transcoder`] decodes one image, flattens it to opaque RGB and
//! re-encodes it under an [`EncodingStrategy`]. [`run_batch`] applies that to
//! every supported image in a folder and reports through [`ProgressSink`] and
//! [`ResultsLog`].

pub mod batch;
pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod processor;
pub mod report;
pub mod sink;
pub mod transcoder;

pub use batch::{run_batch, run_batch_with_cancel, BatchOutcome, CancelFlag};
pub use config::{default_output_folder, BatchConfig, EncodingStrategy, Quality};
pub use error::{BatchError, TranscodeError};
pub use report::{BatchSummary, FileResult};
pub use sink::{BatchEvent, ChannelSink, LogSink, NoopSink, ProgressSink, ResultsLog};
pub use transcoder::{transcode, Transcoder};
