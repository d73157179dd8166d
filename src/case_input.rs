use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_DEFENDANTS: usize = 5;
const MAX_PARAGRAPHS: usize = 10;
const MIN_PARAGRAPH_LEN: usize = 50;
const CHUNK_LEN: usize = 500;
const MIN_SYNOPSIS_LEN: usize = 100;
const MAX_SYNOPSIS_LEN: usize = 500;

/// Suffixes and words that mark a name as an organisation rather than a person.
pub const COMPANY_KEYWORDS: &[&str] = &[
    "CO",
    "LTD",
    "LLC",
    "CORP",
    "LIMITED",
    "PARTNERSHIP",
    "CORPORATION",
    "INC",
    "INCORPORATED",
    "COMPANY",
    "LP",
];

const SYNOPSIS_KEYWORDS: &[&str] = &[
    "summary",
    "synopsis",
    "abstract",
    "overview",
    "background",
    "case summary",
    "executive summary",
];

const NAME: &str = r"([A-Z][a-z]+\s+[A-Z][a-z]+)";

static DEFENDANT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i:defendants?)\s+{NAME}"),
        format!(r"{NAME}[,\s]+(?i:defendant)"),
        format!(r"(?i:charges?\s+against)\s+{NAME}"),
        format!(r"{NAME}[,\s]+(?i:is\s+charged)"),
        format!(r"{NAME}[,\s]+(?i:was\s+indicted)"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("defendant pattern is valid"))
    .collect()
});

static ANY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{NAME}\b")).expect("name pattern is valid"));

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r\f]*\n").expect("paragraph pattern is valid"));

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

/// The structured view of one case that is sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    #[serde(rename = "CaseID")]
    pub case_id: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    pub def_key: Vec<String>,
    #[serde(rename = "Background")]
    pub background: Vec<String>,
    #[serde(rename = "Synopsis", default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    /// Any further fields carried by pre-extracted case files.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CaseInput {
    /// Builds the input for the `index`-th (1-based) file of a run.
    pub fn from_text(index: usize, filename: &str, text: &str) -> Self {
        Self {
            case_id: case_id_for(index),
            filename: filename.to_string(),
            def_key: extract_defendant_names(text),
            background: split_into_paragraphs(text),
            synopsis: extract_synopsis(text),
            extra: serde_json::Map::new(),
        }
    }
}

pub fn case_id_for(index: usize) -> String {
    format!("CASE_{:03}", index)
}

pub fn is_company_name(name: &str) -> bool {
    name.split_whitespace().any(|word| {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_uppercase();
        COMPANY_KEYWORDS.contains(&word.as_str())
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Candidate defendant names, in order of first appearance per pattern.
pub fn extract_defendant_names(text: &str) -> Vec<String> {
    let mut defendants: Vec<String> = Vec::new();

    for pattern in DEFENDANT_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let name = collapse_whitespace(&caps[1]);
            if name.split(' ').count() >= 2
                && !defendants.contains(&name)
                && !is_company_name(&name)
            {
                defendants.push(name);
            }
        }
    }

    if defendants.is_empty() {
        for m in ANY_NAME.find_iter(text).take(MAX_DEFENDANTS) {
            let name = collapse_whitespace(m.as_str());
            if !defendants.contains(&name) && !is_company_name(&name) {
                defendants.push(name);
            }
        }
    }

    defendants.truncate(MAX_DEFENDANTS);
    defendants
}

/// Splits text into sentences, keeping the terminating punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Background paragraphs: blank-line separated blocks, or ~500 char sentence
/// groups when the document has too few real paragraphs.
pub fn split_into_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs: Vec<String> = PARAGRAPH_BREAK
        .split(text)
        .map(collapse_whitespace)
        .filter(|p| p.len() > MIN_PARAGRAPH_LEN)
        .collect();

    if paragraphs.len() < 3 {
        let flat = collapse_whitespace(text);
        let mut chunks = Vec::new();
        let mut current = String::new();
        for sentence in split_sentences(&flat) {
            if !current.is_empty() && current.len() + sentence.len() > CHUNK_LEN {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        paragraphs = chunks
            .into_iter()
            .filter(|p| p.len() > MIN_PARAGRAPH_LEN)
            .collect();
    }

    paragraphs.truncate(MAX_PARAGRAPHS);
    paragraphs
}

pub fn extract_synopsis(text: &str) -> Option<String> {
    for keyword in SYNOPSIS_KEYWORDS {
        let pattern = format!(r"(?i)\b{}\b[:\s]*", regex::escape(keyword));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        let Some(m) = re.find(text) else {
            continue;
        };
        let following = collapse_whitespace(&text[m.end()..]);
        let sentences = split_sentences(&following);
        if sentences.len() < 2 {
            continue;
        }
        let synopsis = sentences
            .iter()
            .take(4)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if synopsis.len() > MIN_SYNOPSIS_LEN {
            return Some(truncate_chars(&synopsis, MAX_SYNOPSIS_LEN));
        }
    }

    let sentences = split_sentences(&collapse_whitespace(text));
    if sentences.len() >= 3 {
        let synopsis = sentences[..3].join(" ");
        if synopsis.len() > MIN_SYNOPSIS_LEN {
            return Some(truncate_chars(&synopsis, MAX_SYNOPSIS_LEN));
        }
    }
    None
}
