use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{BatchConfig, EncodingStrategy};
use crate::error::BatchError;
use crate::io::{collect_files, file_size};
use crate::report::{BatchSummary, FileResult};
use crate::sink::{ProgressSink, ResultsLog};
use crate::transcoder::Transcoder;

/// How a batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Every enumerated file was attempted (or the run was cancelled).
    Completed(BatchSummary),
    /// The input folder held no supported images. Nothing was written.
    EmptyInput,
}

/// Shared flag checked before each file. Raising it stops the batch after
/// the file in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run a batch to completion. See [`run_batch_with_cancel`].
pub fn run_batch(
    config: &BatchConfig,
    progress: &dyn ProgressSink,
    results: &dyn ResultsLog,
) -> Result<BatchOutcome, BatchError> {
    run_batch_with_cancel(config, progress, results, &CancelFlag::new())
}

/// Transcode every supported image in the input folder into the output
/// folder, sequentially and in listing order.
///
/// Folder preconditions are checked first and abort the run. Per-file
/// failures are recorded in `results` and never stop the batch.
pub fn run_batch_with_cancel(
    config: &BatchConfig,
    progress: &dyn ProgressSink,
    results: &dyn ResultsLog,
    cancel: &CancelFlag,
) -> Result<BatchOutcome, BatchError> {
    config.validate()?;

    let files = collect_files(&config.input_folder)?;
    if files.is_empty() {
        log::info!("No supported images in {}", config.input_folder.display());
        return Ok(BatchOutcome::EmptyInput);
    }

    fs::create_dir_all(&config.output_folder).map_err(|e| BatchError::CreateOutput {
        path: config.output_folder.clone(),
        source: e,
    })?;

    let transcoder = Transcoder::default();
    let total = files.len();
    let mut summary = BatchSummary::new(total, config.output_folder.clone());

    log::info!(
        "Processing {} file(s) from {} with {}",
        total,
        config.input_folder.display(),
        config.strategy
    );

    for (idx, input) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            log::warn!("Batch cancelled after {} of {} file(s)", idx, total);
            summary.cancelled = true;
            break;
        }

        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        progress.processing(&filename);

        let result = match input.file_name() {
            Some(name) => process_file(
                &transcoder,
                input,
                &config.output_folder.join(name),
                config.strategy,
                &filename,
            ),
            None => FileResult::failure(&filename, 0, "path has no file name"),
        };

        if let Some(err) = &result.error {
            log::warn!("Error processing {}: {}", input.display(), err);
        }
        results.record(&result);
        summary.add(&result);

        progress.progress(idx + 1, total);
    }

    log::info!(
        "Batch finished: {} of {} file(s) reduced",
        summary.succeeded_count,
        summary.total_files
    );

    Ok(BatchOutcome::Completed(summary))
}

/// Transcode one file and measure it. The original size is taken before
/// writing, since input and output may be the same path.
fn process_file(
    transcoder: &Transcoder,
    input: &Path,
    output: &Path,
    strategy: EncodingStrategy,
    filename: &str,
) -> FileResult {
    let original_size = match file_size(input) {
        Ok(size) => size,
        Err(e) => return FileResult::failure(filename, 0, e.to_string()),
    };

    match transcoder
        .transcode(input, output, strategy)
        .and_then(|()| file_size(output))
    {
        Ok(new_size) => FileResult::success(filename, original_size, new_size),
        Err(e) => FileResult::failure(filename, original_size, e.to_string()),
    }
}
