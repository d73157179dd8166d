use anyhow::Result;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::case_input::CaseInput;
use crate::client::CaseAnalyzer;
use crate::error::StageError;
use crate::output::FailureDetail;
use crate::parser::parse_case_record;
use crate::pdf::TextExtractor;
use crate::progress::ProgressTracker;
use crate::record::CaseRecord;

/// Files directly in `dir` (or below it when `recursive`) with the given
/// extension, compared case-insensitively, sorted by path.
pub fn find_files(dir: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        if path.is_file()
            && path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sends one case to the model and parses its answer.
pub async fn analyze_case(
    analyzer: &dyn CaseAnalyzer,
    case: &CaseInput,
) -> Result<CaseRecord, StageError> {
    let raw = analyzer.analyze(case).await?;
    let record = parse_case_record(&raw)?.with_defaults(case);
    Ok(record)
}

/// Records and failures of a run, both in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<CaseRecord>,
    pub failures: Vec<FailureDetail>,
    pub processed: usize,
}

impl RunReport {
    pub fn successful(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn company_count(&self) -> usize {
        self.records.iter().map(|r| r.companies().len()).sum()
    }

    pub fn evidence_count(&self) -> usize {
        self.records.iter().map(|r| r.evidence().len()).sum()
    }
}

/// Extract, analyze and parse each PDF in turn.
pub struct CasePipeline<'a> {
    extractor: &'a dyn TextExtractor,
    analyzer: &'a dyn CaseAnalyzer,
    request_delay: Duration,
    show_progress: bool,
}

impl<'a> CasePipeline<'a> {
    pub fn new(extractor: &'a dyn TextExtractor, analyzer: &'a dyn CaseAnalyzer) -> Self {
        Self {
            extractor,
            analyzer,
            request_delay: Duration::ZERO,
            show_progress: false,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Runs the full pipeline for the `index`-th (1-based) file.
    pub async fn process_file(&self, index: usize, pdf_path: &Path) -> Result<CaseRecord, StageError> {
        let filename = display_name(pdf_path);

        let text = self.extractor.extract_text(pdf_path)?;
        let case = CaseInput::from_text(index, &filename, &text);
        info!("Defendants found in {}: {:?}", filename, case.def_key);

        analyze_case(self.analyzer, &case).await
    }

    pub async fn process_files(&self, pdf_files: &[PathBuf]) -> RunReport {
        let mut progress = if self.show_progress {
            ProgressTracker::new(pdf_files.len())
        } else {
            ProgressTracker::hidden(pdf_files.len())
        };
        let mut report = RunReport::default();

        for (i, pdf_path) in pdf_files.iter().enumerate() {
            let index = i + 1;
            let filename = display_name(pdf_path);
            info!("Processing file {}/{}: {}", index, pdf_files.len(), filename);
            progress.start(&filename);

            report.processed += 1;
            let result = self.process_file(index, pdf_path).await;
            let called_api = !matches!(result, Err(StageError::Extract(_)));
            match result {
                Ok(record) => {
                    info!("Analysis completed for {}", filename);
                    report.records.push(record);
                    progress.complete(true);
                }
                Err(e) => {
                    match &e {
                        StageError::Extract(_) => warn!("Skipping {}: {}", filename, e),
                        _ => error!("Analysis failed for {}: {}", filename, e),
                    }
                    report.failures.push(FailureDetail {
                        filename: filename.clone(),
                        file_source: pdf_path.display().to_string(),
                        case_index: index,
                        error_type: e.error_type().to_string(),
                        error_message: e.to_string(),
                    });
                    progress.complete(false);
                }
            }

            // No request was sent for an unreadable file.
            if called_api && index < pdf_files.len() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        progress.finish();
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{CompletionError, ExtractError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Text keyed by file name; files not in the map fail extraction.
    pub(crate) struct FakeExtractor(pub HashMap<String, String>);

    impl TextExtractor for FakeExtractor {
        fn extract_text(&self, pdf_path: &Path) -> Result<String, ExtractError> {
            self.0
                .get(&display_name(pdf_path))
                .cloned()
                .ok_or(ExtractError::AllMethodsFailed {
                    primary: "lopdf: not a PDF".into(),
                    fallback: "pdf-extract: not a PDF".into(),
                })
        }
    }

    /// Answers with a canned response per filename and remembers what it saw.
    pub(crate) struct FakeAnalyzer {
        pub responses: HashMap<String, Result<String, u16>>,
        pub seen: Mutex<Vec<CaseInput>>,
    }

    impl FakeAnalyzer {
        pub(crate) fn new(responses: &[(&str, Result<String, u16>)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(name, r)| (name.to_string(), r.clone()))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CaseAnalyzer for FakeAnalyzer {
        async fn analyze(&self, case: &CaseInput) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(case.clone());
            match self.responses.get(&case.filename) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(CompletionError::RetriesExhausted {
                    attempts: 3,
                    last: Box::new(CompletionError::Server {
                        status: *status,
                        body: "unavailable".into(),
                    }),
                }),
                None => Err(CompletionError::EmptyResponse),
            }
        }
    }

    pub(crate) fn answer(filename: &str, company: &str) -> String {
        format!(
            r#"{{"Filename": "{filename}", "Defendant Type": "Individual Only",
                "ExtractedCompany_Individual": "{company}", "ExtractedCompany_Both": "",
                "ExtractEvidence": "{company} => founded {company}"}}"#
        )
    }

    const TEXT: &str = "Defendant John Smith, founder of Acme LLC, pleaded guilty to fraud.";

    fn texts(names: &[&str]) -> FakeExtractor {
        FakeExtractor(
            names
                .iter()
                .map(|n| (n.to_string(), TEXT.to_string()))
                .collect(),
        )
    }

    #[test]
    fn finds_pdfs_case_insensitively_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PDF", "a.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.pdf"), b"x").unwrap();

        let flat = find_files(dir.path(), "pdf", false).unwrap();
        let names: Vec<String> = flat.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);

        let deep = find_files(dir.path(), "pdf", true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[tokio::test]
    async fn one_good_file_yields_one_record() {
        let extractor = texts(&["smith.pdf"]);
        let analyzer = FakeAnalyzer::new(&[("smith.pdf", Ok(answer("smith.pdf", "Acme LLC")))]);
        let pipeline = CasePipeline::new(&extractor, &analyzer);

        let report = pipeline.process_files(&[PathBuf::from("cases/smith.pdf")]).await;

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.case_id, "CASE_001");
        assert_eq!(record.filename, "smith.pdf");
        assert_eq!(record.companies(), vec!["Acme LLC"]);
        assert_eq!(report.company_count(), 1);
        assert_eq!(report.evidence_count(), 1);

        let seen = analyzer.seen.lock().unwrap();
        assert_eq!(seen[0].def_key, vec!["John Smith"]);
    }

    #[tokio::test]
    async fn unreadable_pdf_is_skipped_without_calling_api() {
        let extractor = texts(&["good.pdf"]);
        let analyzer = FakeAnalyzer::new(&[("good.pdf", Ok(answer("good.pdf", "Acme LLC")))]);
        let pipeline = CasePipeline::new(&extractor, &analyzer);

        let report = pipeline
            .process_files(&[PathBuf::from("broken.pdf"), PathBuf::from("good.pdf")])
            .await;

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failures[0].filename, "broken.pdf");
        assert_eq!(report.failures[0].error_type, "Text extraction failed");
        assert_eq!(analyzer.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_delay_follows_api_calls_only() {
        let extractor = texts(&["good.pdf"]);
        let analyzer = FakeAnalyzer::new(&[("good.pdf", Ok(answer("good.pdf", "Acme LLC")))]);
        let pipeline = CasePipeline::new(&extractor, &analyzer).with_request_delay(Duration::from_secs(60));
        let files = [PathBuf::from("broken.pdf"), PathBuf::from("good.pdf")];

        let report = tokio::time::timeout(Duration::from_secs(10), pipeline.process_files(&files))
            .await
            .expect("no delay after an unreadable file or after the last file");

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn mixed_failures_keep_successes_in_order() {
        let names = ["1.pdf", "2.pdf", "3.pdf", "4.pdf", "5.pdf", "6.pdf"];
        let extractor = texts(&["1.pdf", "2.pdf", "4.pdf", "5.pdf", "6.pdf"]);
        let analyzer = FakeAnalyzer::new(&[
            ("1.pdf", Ok(answer("1.pdf", "One Corp"))),
            ("2.pdf", Err(503)),
            ("4.pdf", Ok("```json\nnot json at all\n```".to_string())),
            ("5.pdf", Ok(format!("```json\n{}\n```", answer("5.pdf", "Five LLC")))),
            ("6.pdf", Ok(answer("6.pdf", "Six Inc"))),
        ]);
        let pipeline = CasePipeline::new(&extractor, &analyzer);
        let files: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();

        let report = pipeline.process_files(&files).await;

        assert_eq!(report.processed, 6);
        let ids: Vec<&str> = report.records.iter().map(|r| r.case_id.as_str()).collect();
        assert_eq!(ids, vec!["CASE_001", "CASE_005", "CASE_006"]);
        let failed: Vec<(&str, &str)> = report
            .failures
            .iter()
            .map(|f| (f.filename.as_str(), f.error_type.as_str()))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("2.pdf", "API analysis failed"),
                ("3.pdf", "Text extraction failed"),
                ("4.pdf", "Response parsing failed"),
            ]
        );
    }
}
