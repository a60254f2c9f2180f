use std::sync::mpsc::Receiver;

use indicatif::{ProgressBar, ProgressStyle};

use image_reducer_core::report::format_size;
use image_reducer_core::{BatchEvent, BatchSummary, FileResult};

fn new_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb
}

/// Render batch events until the sending side hangs up. Runs on the
/// caller's thread while the batch works elsewhere.
pub fn render(rx: Receiver<BatchEvent>) {
    let mut bar: Option<ProgressBar> = None;

    for event in rx {
        let pb = bar.get_or_insert_with(new_bar);
        match event {
            BatchEvent::Processing(name) => pb.set_message(format!("Processing: {name}")),
            BatchEvent::Progress { current, total } => {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            }
            BatchEvent::Record(result) => pb.println(format_record(&result)),
        }
    }

    if let Some(pb) = bar {
        pb.finish_with_message("Processing complete");
    }
}

/// Per-file block printed above the progress bar.
pub fn format_record(result: &FileResult) -> String {
    match &result.error {
        None => format!(
            "Processed: {}\n  Original: {}\n  New: {}\n  Reduction: {:.1}%",
            result.filename,
            format_size(result.original_size),
            format_size(result.new_size),
            result.reduction_pct()
        ),
        Some(err) => format!("Failed to process {}: {}", result.filename, err),
    }
}

pub fn format_summary(summary: &BatchSummary) -> String {
    let mut out = String::from("\n--- Summary ---\n");
    if summary.cancelled {
        out.push_str("Cancelled before all files were processed\n");
        out.push_str(&format!(
            "Processed {} of {} images\n",
            summary.attempted, summary.total_files
        ));
    } else {
        out.push_str(&format!("Processed {} images\n", summary.total_files));
    }
    out.push_str(&format!("Successfully reduced: {} images\n", summary.succeeded_count));
    out.push_str(&format!("Output folder: {}", summary.output_folder.display()));

    if summary.succeeded_count > 0 {
        out.push_str(&format!(
            "\nTotal: {} → {} ({:.1}% reduction)",
            format_size(summary.total_original),
            format_size(summary.total_new),
            summary.total_reduction_pct()
        ));
    }
    out
}
