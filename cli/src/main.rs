use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use image_reducer::cli::Cli;
use image_reducer::progress::{format_summary, render};
use image_reducer_core::io::collect_files;
use image_reducer_core::{run_batch, BatchConfig, BatchOutcome, ChannelSink};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if cli.quality_out_of_range() {
        log::warn!("Quality {} is outside 10-95, clamping", cli.quality);
    }

    let config = cli.to_config();
    if cli.dry_run {
        return handle_dry_run(&config);
    }
    handle_reduce(config)
}

fn handle_reduce(config: BatchConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    // The batch runs on its own thread; this one only renders progress.
    let worker_config = config.clone();
    let worker = thread::Builder::new()
        .name("batch".into())
        .spawn(move || {
            let sink = ChannelSink::new(tx);
            run_batch(&worker_config, &sink, &sink)
        })
        .context("Failed to start batch worker")?;

    render(rx);

    let outcome = worker
        .join()
        .map_err(|_| anyhow!("batch worker panicked"))?
        .context("Batch failed")?;

    match outcome {
        BatchOutcome::EmptyInput => {
            println!("No image files found in {}", config.input_folder.display());
        }
        BatchOutcome::Completed(summary) => {
            println!("{}", format_summary(&summary));
        }
    }

    Ok(())
}

fn handle_dry_run(config: &BatchConfig) -> Result<()> {
    config.validate().context("Invalid folders")?;

    let files = collect_files(&config.input_folder).context("Failed to collect input files")?;
    if files.is_empty() {
        println!("No image files found in {}", config.input_folder.display());
        return Ok(());
    }

    println!("[dry-run] Would process {} file(s) with {}:", files.len(), config.strategy);
    for f in &files {
        if let Some(name) = f.file_name() {
            println!("  {} → {}", f.display(), config.output_folder.join(name).display());
        }
    }
    Ok(())
}
