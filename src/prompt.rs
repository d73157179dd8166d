use crate::case_input::CaseInput;

pub const SYSTEM_PROMPT: &str = "You are a professional legal document analysis assistant. \
Please strictly follow the requirements to analyze cases and return accurate JSON format results.";

/// Builds the user message for one case.
pub fn build_prompt(case: &CaseInput) -> Result<String, serde_json::Error> {
    let case_json = serde_json::to_string_pretty(case)?;

    Ok(format!(
        r#"**Prompt for Background Sections - Used to Identify Defendant Companies**

INPUT: A JSON object with the following fields:
```json
{case_json}
```

TASK: For EACH case, analyze only the provided text and return ONE JSON object with EXACTLY these fields:

1. "Case ID": copy exactly from input.
2. "Filename": copy exactly from input.
3. "Defendant Type": strictly choose "Individual Only" OR "Individual and Company".
4. "ExtractedCompany_Individual":
   - Only fill this field if Defendant Type is "Individual Only".
   - List up to 3 company names that the individual defendant (any person listed in the "def_key" section of the input) **founded, co-founded, created, established, organized, formed, set up, incorporated, owned, controlled, ran, directed, managed, was a principal of, or held an officer/director role in** during the illegal activity period.
   - A valid company name must meet ONE of these:
     * Contains one of these keywords (case-insensitive): CO, LTD, LLC, CORP, LIMITED, PARTNERSHIP, CORPORATION, INC, INCORPORATED, COMPANY, LP.
     * OR is written in ALL CAPS or has a parenthetical abbreviation (e.g., "Medical Safety Solutions (MSS)" or "MSS") **and** is explicitly linked to the defendant via the above relationship verbs.
   - Separate multiple company names with ";". If no qualifying company is explicitly linked, return an empty string.
5. "ExtractedCompany_Both":
   - Only fill this field if Defendant Type is "Individual and Company".
   - List up to 3 company names that are explicitly named as **defendant companies** in the case.
   - Apply the same name rules as above.
   - Separate multiple names with ";" or leave empty string if unclear.
6. "ExtractEvidence":
   - For each extracted company, copy the exact sentence or sentence fragment from the text that links the defendant and the company.
   - Format each as: `Company => sentence`.
   - Separate multiple entries with ";". If no company is extracted, return an empty string.

CONSTRAINTS:
- Use only information explicitly stated or strongly implied by the text. Do NOT invent names or links.
- Do not add commentary, explanations, or extra fields.
- Ensure the JSON output is syntactically valid.

Return ONLY the JSON result with no additional text or explanations.
"#
    ))
}
