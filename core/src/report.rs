use std::path::PathBuf;

use serde::Serialize;

/// Result of processing a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub original_size: u64,
    pub new_size: u64,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(filename: impl Into<String>, original_size: u64, new_size: u64) -> Self {
        Self {
            filename: filename.into(),
            original_size,
            new_size,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(filename: impl Into<String>, original_size: u64, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            original_size,
            new_size: 0,
            succeeded: false,
            error: Some(error.into()),
        }
    }

    /// `(original - new) / original * 100`. Negative when the file grew.
    pub fn reduction_pct(&self) -> f64 {
        reduction_pct(self.original_size, self.new_size)
    }
}

/// Aggregate report for a finished (or cancelled) batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_files: usize,
    /// Files actually handed to the transcoder. Below `total_files` only
    /// when the run was cancelled.
    pub attempted: usize,
    pub succeeded_count: usize,
    pub output_folder: PathBuf,
    /// Sum of original sizes over successful files.
    pub total_original: u64,
    /// Sum of new sizes over successful files.
    pub total_new: u64,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(total_files: usize, output_folder: PathBuf) -> Self {
        Self {
            total_files,
            attempted: 0,
            succeeded_count: 0,
            output_folder,
            total_original: 0,
            total_new: 0,
            cancelled: false,
        }
    }

    pub fn add(&mut self, result: &FileResult) {
        self.attempted += 1;
        if result.succeeded {
            self.succeeded_count += 1;
            self.total_original += result.original_size;
            self.total_new += result.new_size;
        }
    }

    /// Attempted files that failed. Files skipped by a cancel are not failures.
    pub fn failed_count(&self) -> usize {
        self.attempted - self.succeeded_count
    }

    pub fn total_reduction_pct(&self) -> f64 {
        reduction_pct(self.total_original, self.total_new)
    }
}

fn reduction_pct(original: u64, new: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - new as f64) / original as f64 * 100.0
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
