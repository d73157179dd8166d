use serde::{Deserialize, Deserializer, Serialize};

use crate::case_input::CaseInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefendantType {
    #[serde(rename = "Individual Only")]
    IndividualOnly,
    #[serde(rename = "Individual and Company")]
    IndividualAndCompany,
}

/// Structured extraction result for one case file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "Case ID", alias = "CaseID", default, deserialize_with = "lenient_string")]
    pub case_id: String,
    #[serde(rename = "Filename", default, deserialize_with = "lenient_string")]
    pub filename: String,
    #[serde(rename = "Defendant Type")]
    pub defendant_type: DefendantType,
    #[serde(
        rename = "ExtractedCompany_Individual",
        alias = "ExtractedComapny_Individual",
        default,
        deserialize_with = "lenient_string"
    )]
    pub extracted_company_individual: String,
    #[serde(
        rename = "ExtractedCompany_Both",
        alias = "ExtractedComapny_Both",
        default,
        deserialize_with = "lenient_string"
    )]
    pub extracted_company_both: String,
    #[serde(rename = "ExtractEvidence", default, deserialize_with = "lenient_string")]
    pub extract_evidence: String,
}

/// One `Company => sentence` entry of the evidence field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub company: String,
    pub sentence: String,
}

impl CaseRecord {
    /// Fills an empty case id or filename from the input the record answers.
    pub fn with_defaults(mut self, case: &CaseInput) -> Self {
        if self.case_id.trim().is_empty() {
            self.case_id = case.case_id.clone();
        }
        if self.filename.trim().is_empty() {
            self.filename = case.filename.clone();
        }
        self
    }

    /// Company names from the field that matches the defendant type.
    pub fn companies(&self) -> Vec<String> {
        let field = match self.defendant_type {
            DefendantType::IndividualOnly => &self.extracted_company_individual,
            DefendantType::IndividualAndCompany => &self.extracted_company_both,
        };
        field
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        let mut entries: Vec<Evidence> = Vec::new();
        for part in self.extract_evidence.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once("=>") {
                Some((company, sentence)) => entries.push(Evidence {
                    company: company.trim().to_string(),
                    sentence: sentence.trim().to_string(),
                }),
                // a ';' inside the quoted sentence
                None => match entries.last_mut() {
                    Some(last) => {
                        last.sentence.push_str("; ");
                        last.sentence.push_str(part);
                    }
                    None => entries.push(Evidence {
                        company: String::new(),
                        sentence: part.to_string(),
                    }),
                },
            }
        }
        entries
    }
}

/// Accepts strings, numbers, null and string lists where the schema wants a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> CaseRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn serialises_with_output_schema_keys() {
        let rec = CaseRecord {
            case_id: "CASE_001".into(),
            filename: "a.pdf".into(),
            defendant_type: DefendantType::IndividualOnly,
            extracted_company_individual: "Acme LLC".into(),
            extracted_company_both: String::new(),
            extract_evidence: "Acme LLC => Smith founded Acme LLC".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["Case ID"], "CASE_001");
        assert_eq!(json["Defendant Type"], "Individual Only");
        assert_eq!(json["ExtractedCompany_Individual"], "Acme LLC");
        assert_eq!(json.as_object().unwrap().len(), 6);
    }

    #[test]
    fn accepts_misspelled_keys_numbers_and_nulls() {
        let rec = record(
            r#"{"CaseID": 51, "Filename": "x.pdf", "Defendant Type": "Individual and Company",
                "ExtractedComapny_Individual": null,
                "ExtractedComapny_Both": ["Acme Inc", "Globex Corp"],
                "ExtractEvidence": ""}"#,
        );
        assert_eq!(rec.case_id, "51");
        assert_eq!(rec.extracted_company_individual, "");
        assert_eq!(rec.companies(), vec!["Acme Inc", "Globex Corp"]);
    }

    #[test]
    fn companies_follow_defendant_type() {
        let rec = record(
            r#"{"Case ID": "CASE_002", "Filename": "b.pdf", "Defendant Type": "Individual Only",
                "ExtractedCompany_Individual": "Acme LLC; ; MSS",
                "ExtractedCompany_Both": "Ignored Corp",
                "ExtractEvidence": ""}"#,
        );
        assert_eq!(rec.companies(), vec!["Acme LLC", "MSS"]);
    }

    #[test]
    fn evidence_entries_keep_inner_semicolons() {
        let rec = record(
            r#"{"Case ID": "CASE_003", "Filename": "c.pdf", "Defendant Type": "Individual Only",
                "ExtractedCompany_Individual": "Acme LLC;MSS",
                "ExtractEvidence": "Acme LLC => Smith owned Acme LLC; he also ran it;MSS => Smith directed Medical Safety Solutions (MSS)"}"#,
        );
        let evidence = rec.evidence();
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].company, "Acme LLC");
        assert_eq!(evidence[0].sentence, "Smith owned Acme LLC; he also ran it");
        assert_eq!(evidence[1].company, "MSS");
    }

    #[test]
    fn defaults_fill_missing_identity() {
        let rec = record(r#"{"Defendant Type": "Individual Only"}"#);
        let case = CaseInput::from_text(4, "d.pdf", "");
        let rec = rec.with_defaults(&case);
        assert_eq!(rec.case_id, "CASE_004");
        assert_eq!(rec.filename, "d.pdf");
    }

    #[test]
    fn unknown_defendant_type_is_rejected() {
        let result: Result<CaseRecord, _> =
            serde_json::from_str(r#"{"Case ID": "1", "Defendant Type": "Company Only"}"#);
        assert!(result.is_err());
    }
}
