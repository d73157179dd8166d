//! Analysis of pre-extracted case files.
//!
//! Each input file holds either an array of case objects or a single case
//! object. Items are normalised into a [`CaseInput`] (accepting the lower-case
//! `filename`/`index`/`background` spellings), validated, and sent through the
//! same completion and parsing stages as PDF cases.

use anyhow::Result;
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::case_input::CaseInput;
use crate::client::CaseAnalyzer;
use crate::output::FailureDetail;
use crate::pipeline::{analyze_case, display_name};
use crate::progress::ProgressTracker;
use crate::record::CaseRecord;

#[derive(Debug, Clone)]
pub struct JsonRunOptions {
    /// Leading items of each file that are not analysed.
    pub skip: usize,
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub request_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file: String,
    pub selected: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct JsonRunReport {
    pub records: Vec<CaseRecord>,
    pub failures: Vec<FailureDetail>,
    pub processed: usize,
    pub files: Vec<FileSummary>,
}

/// Items of a loaded file that should be analysed, with their 1-based index
/// in the file.
pub fn select_cases(content: Value, skip: usize) -> Option<Vec<(usize, Value)>> {
    match content {
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .skip(skip)
                .map(|(i, item)| (i + 1, item))
                .collect(),
        ),
        Value::Object(_) if skip == 0 => Some(vec![(1, content)]),
        Value::Object(_) => Some(Vec::new()),
        _ => None,
    }
}

fn take_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_string_list(value: Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s]),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn take_first(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in keys {
        if let Some(value) = map.remove(*key) {
            if found.is_none() && !value.is_null() {
                found = Some(value);
            }
        }
    }
    found
}

/// An item that cannot be analysed, reported under the filename it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCase {
    pub filename: String,
    pub message: String,
}

/// Maps one raw item onto a case input. The filename is resolved first
/// (`Filename`, then `filename`, then the source file) so a rejected item
/// still carries it.
pub fn normalize_case(item: Value, json_file: &str) -> Result<CaseInput, InvalidCase> {
    let Value::Object(mut map) = item else {
        return Err(InvalidCase {
            filename: json_file.to_string(),
            message: "Case is not a JSON object".to_string(),
        });
    };

    let filename = take_first(&mut map, &["Filename", "filename"])
        .and_then(take_string)
        .unwrap_or_else(|| json_file.to_string());
    let invalid = |message: &str| InvalidCase {
        filename: filename.clone(),
        message: message.to_string(),
    };

    let case_id = take_first(&mut map, &["CaseID", "index"])
        .and_then(take_string)
        .ok_or_else(|| invalid("Missing required field: CaseID or index"))?;
    let def_key = take_first(&mut map, &["def_key"])
        .and_then(take_string_list)
        .ok_or_else(|| invalid("Missing required field: def_key"))?;
    let background = take_first(&mut map, &["Background", "background"])
        .and_then(take_string_list)
        .ok_or_else(|| invalid("Missing required field: Background or background"))?;
    let synopsis = take_first(&mut map, &["Synopsis", "synopsis"]).and_then(take_string);

    Ok(CaseInput {
        case_id,
        filename,
        def_key,
        background,
        synopsis,
        extra: map,
    })
}

async fn load_json_file(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

pub async fn process_json_files(
    json_files: &[PathBuf],
    analyzer: &dyn CaseAnalyzer,
    options: &JsonRunOptions,
    show_progress: bool,
) -> JsonRunReport {
    let mut report = JsonRunReport::default();

    for (i, path) in json_files.iter().enumerate() {
        let json_file = display_name(path);
        info!("Processing file {}/{}: {}", i + 1, json_files.len(), json_file);

        let content = match load_json_file(path).await {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to load {}: {}", json_file, e);
                continue;
            }
        };

        let Some(cases) = select_cases(content, options.skip) else {
            warn!("Invalid JSON structure in {}", json_file);
            continue;
        };
        if cases.is_empty() {
            info!("No cases to process in {} after skipping {}", json_file, options.skip);
            continue;
        }
        info!("Processing {} cases from {}", cases.len(), json_file);

        let summary = process_file_cases(&json_file, cases, analyzer, options, show_progress, &mut report).await;
        info!(
            "File {} summary: {} successful, {} failed",
            summary.file, summary.successful, summary.failed
        );
        report.files.push(summary);
    }

    report
}

async fn process_file_cases(
    json_file: &str,
    cases: Vec<(usize, Value)>,
    analyzer: &dyn CaseAnalyzer,
    options: &JsonRunOptions,
    show_progress: bool,
    report: &mut JsonRunReport,
) -> FileSummary {
    let total = cases.len();
    let mut progress = if show_progress {
        ProgressTracker::new(total)
    } else {
        ProgressTracker::hidden(total)
    };
    let mut summary = FileSummary {
        file: json_file.to_string(),
        selected: total,
        successful: 0,
        failed: 0,
    };
    let mut processed_in_file = 0;

    for (position, (case_index, item)) in cases.into_iter().enumerate() {
        let is_last = position + 1 == total;

        let case = match normalize_case(item, json_file) {
            Ok(case) => case,
            Err(invalid) => {
                warn!(
                    "Invalid case data in {}, case {} ({}): {}",
                    json_file, case_index, invalid.filename, invalid.message
                );
                report.failures.push(FailureDetail {
                    filename: invalid.filename,
                    file_source: json_file.to_string(),
                    case_index,
                    error_type: "Invalid case data".to_string(),
                    error_message: invalid.message,
                });
                summary.failed += 1;
                progress.complete(false);
                continue;
            }
        };

        processed_in_file += 1;
        report.processed += 1;
        progress.start(&case.case_id);
        info!("Processing case {} ({}/{})", case_index, position + 1, total);

        match analyze_case(analyzer, &case).await {
            Ok(record) => {
                report.records.push(record);
                summary.successful += 1;
                progress.complete(true);
            }
            Err(e) => {
                error!("Analysis failed for case {} in {}: {}", case_index, json_file, e);
                report.failures.push(FailureDetail {
                    filename: case.filename.clone(),
                    file_source: json_file.to_string(),
                    case_index,
                    error_type: e.error_type().to_string(),
                    error_message: e.to_string(),
                });
                summary.failed += 1;
                progress.complete(false);
            }
        }

        if is_last {
            continue;
        }
        if !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }
        if options.batch_size > 0 && processed_in_file % options.batch_size == 0 && !options.batch_pause.is_zero() {
            info!(
                "Completed {} cases, pausing for {:.0}s",
                processed_in_file,
                options.batch_pause.as_secs_f64()
            );
            tokio::time::sleep(options.batch_pause).await;
        }
    }

    progress.finish();
    summary
}
