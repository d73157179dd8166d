use crate::error::ParseError;
use crate::record::CaseRecord;

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut content = raw.trim();

    if let Some(rest) = content.strip_prefix("```") {
        // drop the info string ("json", "JSON", ...) up to the first newline
        content = match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = content.trim_end().strip_suffix("```") {
        content = rest;
    }

    content.trim()
}

pub fn parse_case_record(raw: &str) -> Result<CaseRecord, ParseError> {
    let content = strip_code_fences(raw);
    if content.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(content)?)
}
