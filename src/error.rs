use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{method} extraction failed: {message}")]
    Method { method: &'static str, message: String },

    #[error("no text could be extracted (primary: {primary}; fallback: {fallback})")]
    AllMethodsFailed { primary: String, fallback: String },

    #[error("extracted text is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("failed to build prompt: {0}")]
    Prompt(#[from] serde_json::Error),

    #[error("response contained no message content")]
    EmptyResponse,

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<CompletionError>,
    },
}

impl CompletionError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            CompletionError::Server { status, .. } => *status == 429 || *status >= 500,
            CompletionError::Prompt(_)
            | CompletionError::EmptyResponse
            | CompletionError::RetriesExhausted { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is empty after stripping code fences")]
    Empty,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A failure at one stage of the per-file pipeline.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("text extraction: {0}")]
    Extract(#[from] ExtractError),

    #[error("completion: {0}")]
    Completion(#[from] CompletionError),

    #[error("response parsing: {0}")]
    Parse(#[from] ParseError),
}

impl StageError {
    /// Label written to the failure log.
    pub fn error_type(&self) -> &'static str {
        match self {
            StageError::Extract(_) => "Text extraction failed",
            StageError::Completion(_) => "API analysis failed",
            StageError::Parse(_) => "Response parsing failed",
        }
    }
}
