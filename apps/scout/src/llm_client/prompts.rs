// Discovery prompt shared by every generative backend.
// Backends send it verbatim; only the exclusion list varies.

use crate::models::candidate::CompanyCandidate;

/// Discovery prompt template. Replace `{existing_companies}` before sending.
pub const DISCOVERY_PROMPT_TEMPLATE: &str = r#"
You are generating a list of companies that use Greenhouse or Lever for job postings.

Output Rules:
- Return ONLY valid JSON
- Do NOT include explanations, comments, or markdown
- Do NOT include trailing commas
- Return an array of objects
- Each object must follow this exact schema:

[
  {
    "company_name": "Public-facing company name",
    "registered_name": "greenhouse-board-identifier"
  }
]

Existing Companies (DO NOT include any of these):
{existing_companies}

Constraints:
- Generate as MANY companies as possible
- All companies must be:
  - US-based
  - Healthcare-related (hospitals, health systems, clinics, health tech, biotech, pharma, diagnostics, care providers, etc.)
  - Actively using Greenhouse or Lever
- Each company must be UNIQUE
- Do NOT return any company whose company_name OR registered_name already exists in the list above
- registered_name must match the Greenhouse job board identifier format (used in Greenhouse URLs)

Return only the JSON array.
"#;

/// Builds the discovery prompt, listing `existing` companies the model must skip.
pub fn build_discovery_prompt(existing: &[CompanyCandidate]) -> String {
    // Serializing a Vec of plain string structs cannot fail.
    let existing_json = serde_json::to_string(existing).unwrap_or_else(|_| "[]".to_string());
    DISCOVERY_PROMPT_TEMPLATE.replace("{existing_companies}", &existing_json)
}
