use log::{info, warn};
use std::path::Path;

use crate::error::ExtractError;

/// One way of pulling plain text out of a PDF.
pub trait ExtractionMethod {
    fn name(&self) -> &'static str;
    fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError>;
}

/// Anything the pipeline can ask for the text of a file.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf_path: &Path) -> Result<String, ExtractError>;
}

/// Page-by-page extraction through lopdf.
pub struct LopdfMethod;

impl ExtractionMethod for LopdfMethod {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError> {
        let document = lopdf::Document::load(pdf_path).map_err(|e| ExtractError::Method {
            method: self.name(),
            message: format!("failed to load PDF document: {}", e),
        })?;

        let mut text = String::new();
        for (page_num, _) in document.get_pages() {
            match document.extract_text(&[page_num]) {
                Ok(page_text) => {
                    if !page_text.trim().is_empty() {
                        text.push_str(&page_text);
                        text.push('\n');
                    }
                }
                Err(e) => {
                    warn!("Failed to extract text from page {}: {}", page_num, e);
                }
            }
        }

        Ok(text)
    }
}

/// Whole-document extraction through pdf-extract.
pub struct PdfExtractMethod;

impl ExtractionMethod for PdfExtractMethod {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, pdf_path: &Path) -> Result<String, ExtractError> {
        // pdf-extract panics on some malformed fonts instead of returning an error
        let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text(pdf_path));
        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExtractError::Method {
                method: self.name(),
                message: e.to_string(),
            }),
            Err(_) => Err(ExtractError::Method {
                method: self.name(),
                message: "extractor panicked".to_string(),
            }),
        }
    }
}

/// Primary method with a single fallback.
pub struct PdfProcessor {
    primary: Box<dyn ExtractionMethod + Send + Sync>,
    fallback: Box<dyn ExtractionMethod + Send + Sync>,
}

impl PdfProcessor {
    pub fn new() -> Self {
        Self::with_methods(Box::new(LopdfMethod), Box::new(PdfExtractMethod))
    }

    pub fn with_methods(
        primary: Box<dyn ExtractionMethod + Send + Sync>,
        fallback: Box<dyn ExtractionMethod + Send + Sync>,
    ) -> Self {
        Self { primary, fallback }
    }

    fn attempt(&self, method: &dyn ExtractionMethod, pdf_path: &Path) -> Result<String, ExtractError> {
        let text = method.extract(pdf_path)?;
        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }
        Ok(text)
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfProcessor {
    /// Empty output from a method counts as a failure of that method.
    fn extract_text(&self, pdf_path: &Path) -> Result<String, ExtractError> {
        let primary_err = match self.attempt(self.primary.as_ref(), pdf_path) {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        warn!(
            "{} failed for {}: {}; trying {}",
            self.primary.name(),
            pdf_path.display(),
            primary_err,
            self.fallback.name()
        );

        match self.attempt(self.fallback.as_ref(), pdf_path) {
            Ok(text) => {
                info!("Using {} fallback for {}", self.fallback.name(), pdf_path.display());
                Ok(text)
            }
            Err(fallback_err) => Err(ExtractError::AllMethodsFailed {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        result: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl ExtractionMethod for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _pdf_path: &Path) -> Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.result {
                Some(text) => Ok(text.to_string()),
                None => Err(ExtractError::Method {
                    method: "fixed",
                    message: "broken".to_string(),
                }),
            }
        }
    }

    fn fixed(result: Option<&'static str>) -> (Box<Fixed>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(Fixed { result, calls: calls.clone() }), calls)
    }

    /// Writes a one-page PDF with a single line of Courier text.
    fn write_text_pdf(path: &Path, line: &str) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn primary_result_skips_fallback() {
        let (primary, _) = fixed(Some("indictment text"));
        let (fallback, fallback_calls) = fixed(Some("other"));
        let processor = PdfProcessor::with_methods(primary, fallback);

        let text = processor.extract_text(Path::new("case.pdf")).unwrap();
        assert_eq!(text, "indictment text");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn falls_back_when_primary_errors_or_is_blank() {
        let (primary, _) = fixed(None);
        let (fallback, _) = fixed(Some("from fallback"));
        let processor = PdfProcessor::with_methods(primary, fallback);
        assert_eq!(processor.extract_text(Path::new("a.pdf")).unwrap(), "from fallback");

        let (primary, _) = fixed(Some("  \n "));
        let (fallback, calls) = fixed(Some("from fallback"));
        let processor = PdfProcessor::with_methods(primary, fallback);
        assert_eq!(processor.extract_text(Path::new("a.pdf")).unwrap(), "from fallback");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn both_methods_failing_reports_both() {
        let (primary, _) = fixed(None);
        let (fallback, _) = fixed(Some(""));
        let processor = PdfProcessor::with_methods(primary, fallback);

        let err = processor.extract_text(Path::new("a.pdf")).unwrap_err();
        match err {
            ExtractError::AllMethodsFailed { primary, fallback } => {
                assert!(primary.contains("broken"));
                assert_eq!(fallback, "extracted text is empty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_file_fails_both_real_methods() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-pdf.pdf");
        std::fs::write(&path, b"this is plainly not a PDF document").unwrap();

        let err = PdfProcessor::new().extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::AllMethodsFailed { .. }));
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.pdf");
        write_text_pdf(&path, "Defendant John Smith");

        let text = PdfProcessor::new().extract_text(&path).unwrap();
        assert!(text.contains("Smith"), "got {text:?}");
    }
}
