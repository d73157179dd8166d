use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use case_defendant_extractor::cli::{init_logging, Args};
use case_defendant_extractor::client::CompletionClient;
use case_defendant_extractor::config::Config;
use case_defendant_extractor::output::{write_failure_log, write_records, FailureLog};
use case_defendant_extractor::pdf::PdfProcessor;
use case_defendant_extractor::pipeline::{find_files, CasePipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.api.verbose);

    let config = Config::from_pdf_args(&args).context("Configuration error")?;

    info!("🦀 Case defendant extractor starting...");
    info!("Model: {}", config.completion.model);
    info!("Input: {}", config.input_dir.display());

    let pdf_files = find_files(&config.input_dir, "pdf", config.recursive)?;

    if pdf_files.is_empty() {
        warn!("No PDF files found in {}", config.input_dir.display());
        return Ok(());
    }

    info!("Found {} PDF files", pdf_files.len());

    let extractor = PdfProcessor::new();
    let client = CompletionClient::new(config.completion.clone())?;
    let pipeline = CasePipeline::new(&extractor, &client)
        .with_request_delay(config.request_delay)
        .with_progress(true);

    let report = pipeline.process_files(&pdf_files).await;

    let total_written = write_records(&config.output_file, &report.records, config.append).await?;

    if let Some(failure_log) = &config.failure_log {
        if !report.failures.is_empty() {
            write_failure_log(failure_log, &FailureLog::new(&report.failures)).await?;
        }
    }

    println!("\n🎉 Analysis complete!");
    println!("Processed: {}/{} PDFs", report.processed, pdf_files.len());
    println!("Successful: {}", report.successful());
    println!("Failed: {}", report.failed());
    println!(
        "Companies extracted: {} ({} evidence entries)",
        report.company_count(),
        report.evidence_count()
    );
    for failure in &report.failures {
        println!("  ✗ {}: {}", failure.filename, failure.error_message);
    }
    println!(
        "Results: {} ({} records)",
        config.output_file.display(),
        total_written
    );

    Ok(())
}
