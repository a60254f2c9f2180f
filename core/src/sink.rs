//! Reporting interfaces between the batch driver and whatever front end is
//! watching it.

use std::sync::mpsc::Sender;

use crate::report::{format_size, FileResult};

/// Receives progress while a batch runs.
pub trait ProgressSink {
    /// Called right before a file is transcoded.
    fn processing(&self, filename: &str);
    /// Called after each file, whatever the outcome. `current` is 1-based.
    fn progress(&self, current: usize, total: usize);
}

/// Receives one record per attempted file.
pub trait ResultsLog {
    fn record(&self, result: &FileResult);
}

/// Discards everything.
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn processing(&self, _filename: &str) {}
    fn progress(&self, _current: usize, _total: usize) {}
}

impl ResultsLog for NoopSink {
    fn record(&self, _result: &FileResult) {}
}

/// Writes per-file outcomes through the `log` facade.
pub struct LogSink;

impl ResultsLog for LogSink {
    fn record(&self, result: &FileResult) {
        match &result.error {
            None => log::info!(
                "Processed {}: {} -> {} ({:.1}% reduction)",
                result.filename,
                format_size(result.original_size),
                format_size(result.new_size),
                result.reduction_pct()
            ),
            Some(err) => log::error!("Failed to process {}: {}", result.filename, err),
        }
    }
}

impl ProgressSink for LogSink {
    fn processing(&self, filename: &str) {
        log::debug!("Processing: {}", filename);
    }

    fn progress(&self, current: usize, total: usize) {
        log::debug!("Progress: {}/{}", current, total);
    }
}

/// Everything a batch reports, as a single message type.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Processing(String),
    Progress { current: usize, total: usize },
    Record(FileResult),
}

/// Forwards events over a channel so the batch never waits on rendering.
/// A dropped receiver is ignored.
pub struct ChannelSink {
    tx: Sender<BatchEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn processing(&self, filename: &str) {
        let _ = self.tx.send(BatchEvent::Processing(filename.to_string()));
    }

    fn progress(&self, current: usize, total: usize) {
        let _ = self.tx.send(BatchEvent::Progress { current, total });
    }
}

impl ResultsLog for ChannelSink {
    fn record(&self, result: &FileResult) {
        let _ = self.tx.send(BatchEvent::Record(result.clone()));
    }
}
