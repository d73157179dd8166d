use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use case_defendant_extractor::cli::{init_logging, JsonArgs};
use case_defendant_extractor::client::CompletionClient;
use case_defendant_extractor::config::{seconds, Config};
use case_defendant_extractor::json_cases::{process_json_files, JsonRunOptions};
use case_defendant_extractor::output::{failure_counts, write_failure_log, write_records, FailureLog};
use case_defendant_extractor::pipeline::find_files;

#[tokio::main]
async fn main() -> Result<()> {
    let args = JsonArgs::parse();
    init_logging(args.api.verbose);

    let config = Config::from_json_args(&args).context("Configuration error")?;
    let options = JsonRunOptions {
        skip: args.skip,
        batch_size: args.batch_size,
        batch_pause: seconds(args.batch_pause, "--batch-pause")?,
        request_delay: config.request_delay,
    };

    info!("Processing JSON case files from {}", config.input_dir.display());
    info!("Skipping the first {} cases of each file", options.skip);

    let json_files = find_files(&config.input_dir, "json", false)?;
    if json_files.is_empty() {
        warn!("No JSON files found in {}", config.input_dir.display());
        return Ok(());
    }

    info!("Found {} JSON files", json_files.len());

    let client = CompletionClient::new(config.completion.clone())?;
    let report = process_json_files(&json_files, &client, &options, true).await;

    println!("\n{}", "=".repeat(50));
    println!("PROCESSING SUMMARY");
    println!("{}", "=".repeat(50));
    println!("Total cases processed: {}", report.processed);
    println!("Successful analyses: {}", report.records.len());
    println!("Failed cases: {}", report.failures.len());

    for file in &report.files {
        println!(
            "  {}: {} selected, {} successful, {} failed",
            file.file, file.selected, file.successful, file.failed
        );
    }

    if report.failures.is_empty() {
        println!("\nNo failed cases!");
    } else {
        println!("\nFAILED CASE DETAILS ({} total):", report.failures.len());
        println!("{}", "-".repeat(50));
        for (i, failure) in report.failures.iter().enumerate() {
            println!("  {}. File: {}", i + 1, failure.filename);
            println!("     Source: {}, Case: {}", failure.file_source, failure.case_index);
            println!("     Error: {} - {}", failure.error_type, failure.error_message);
        }

        println!("\nFAILED CASE FILENAMES:");
        println!("{}", "-".repeat(50));
        for (filename, count) in failure_counts(&report.failures) {
            println!("  {} (failed: {})", filename, count);
        }

        if let Some(failure_log) = &config.failure_log {
            write_failure_log(failure_log, &FailureLog::new(&report.failures)).await?;
        }
    }

    if report.records.is_empty() && !config.append {
        println!("\n✗ No successful analyses to save");
        return Ok(());
    }

    let total_written = write_records(&config.output_file, &report.records, config.append).await?;
    println!(
        "\n✓ Results saved to: {} ({} records)",
        config.output_file.display(),
        total_written
    );

    Ok(())
}
