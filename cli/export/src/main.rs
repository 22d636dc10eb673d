//! px-export CLI
//!
//! Parallel export of the partitions under an S3 prefix.

use clap::Parser;
use std::time::Instant;
use tracing::info;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr
    run::init_logging(args.log_level)?;

    let started = Instant::now();
    let summary = run::execute(&args).await?;
    info!("Execution time: {:.2?}", started.elapsed());

    eprintln!();
    eprintln!("Export completed:");
    eprintln!("  Partitions found:     {}", summary.partitions_discovered);
    eprintln!("  Partitions skipped:   {}", summary.partitions_skipped);
    eprintln!("  Partitions exported:  {}", summary.partitions_completed);
    eprintln!("  Partitions partial:   {}", summary.partial_partitions.len());
    eprintln!("  Partitions failed:    {}", summary.failed_partitions.len());
    eprintln!("  Objects written:      {}", summary.entries_written);
    eprintln!("  Bytes listed:         {}", format_bytes(summary.bytes_listed));

    if let Some(duration) = summary.duration() {
        eprintln!(
            "  Duration:             {:.2}s",
            duration.num_milliseconds() as f64 / 1000.0
        );

        if let Some(eps) = summary.entries_per_second() {
            eprintln!("  Throughput:           {:.1} objects/sec", eps);
        }
    }

    if args.stats_json {
        eprintln!("{}", serde_json::to_string(&summary)?);
    }

    if summary.has_failures() {
        for partition in &summary.partial_partitions {
            eprintln!("  Partial: {}", partition);
        }
        for partition in &summary.failed_partitions {
            eprintln!("  Failed:  {}", partition);
        }
        if !summary.partial_partitions.is_empty() {
            eprintln!("Partial outputs are kept; re-run with --force to export them again.");
        }
        if !summary.failed_partitions.is_empty() {
            eprintln!("Failed partitions have no output; re-run to export them.");
        }
        std::process::exit(4); // Partial failure
    }

    Ok(())
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
