use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::record::CaseRecord;

/// Why one case produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub filename: String,
    pub file_source: String,
    pub case_index: usize,
    pub error_type: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub total_failed_cases: usize,
    pub total_failed_filenames: usize,
    pub total_unique_failed_filenames: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureLog {
    pub timestamp: String,
    pub summary: FailureSummary,
    pub failed_case_details: Vec<FailureDetail>,
    pub failed_case_filenames: Vec<String>,
    pub unique_failed_case_filenames: Vec<String>,
}

impl FailureLog {
    pub fn new(details: &[FailureDetail]) -> Self {
        let filenames: Vec<String> = details.iter().map(|d| d.filename.clone()).collect();
        let unique: Vec<String> = failure_counts(details)
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            summary: FailureSummary {
                total_failed_cases: details.len(),
                total_failed_filenames: filenames.len(),
                total_unique_failed_filenames: unique.len(),
            },
            failed_case_details: details.to_vec(),
            failed_case_filenames: filenames,
            unique_failed_case_filenames: unique,
        }
    }
}

/// Failure count per filename, in order of first failure.
pub fn failure_counts(details: &[FailureDetail]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for detail in details {
        match counts.iter_mut().find(|(name, _)| *name == detail.filename) {
            Some((_, count)) => *count += 1,
            None => counts.push((detail.filename.clone(), 1)),
        }
    }
    counts
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Writes the records as a JSON array, optionally after the records already
/// in the file. Returns the length of the array written.
pub async fn write_records(path: &Path, records: &[CaseRecord], append: bool) -> Result<usize> {
    let mut collection: Vec<serde_json::Value> = Vec::new();

    if append && tokio::fs::try_exists(path).await.unwrap_or(false) {
        let existing = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if !existing.trim().is_empty() {
            collection = serde_json::from_str(&existing).with_context(|| {
                format!("{} does not hold a JSON array of records", path.display())
            })?;
        }
    }

    for record in records {
        collection.push(serde_json::to_value(record)?);
    }

    write_json(path, &collection).await?;
    info!("Wrote {} records to {}", collection.len(), path.display());
    Ok(collection.len())
}

pub async fn write_failure_log(path: &Path, log: &FailureLog) -> Result<()> {
    write_json(path, log).await?;
    info!("Failure log saved to {}", path.display());
    Ok(())
}
