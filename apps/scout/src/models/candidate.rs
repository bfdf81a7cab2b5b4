use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::llm_client::LlmError;

/// A company proposed by a generative backend, not yet confirmed on any board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    /// Public-facing company name. This is the value probed against the boards.
    pub company_name: String,
    /// Board identifier the model believes the company uses.
    pub registered_name: String,
}

/// Candidates accepted from one backend response, plus how many entries were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateBatch {
    pub candidates: Vec<CompanyCandidate>,
    pub rejected: usize,
}

impl CandidateBatch {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Parses backend text into candidates.
///
/// The payload must be a JSON array. Elements that are not objects with
/// non-empty string `company_name` and `registered_name` fields are skipped
/// and counted in `rejected`.
pub fn parse_candidates(text: &str) -> Result<CandidateBatch, LlmError> {
    let value: Value = serde_json::from_str(text)?;

    let Value::Array(entries) = value else {
        return Err(LlmError::Shape(format!(
            "expected a JSON array, got {}",
            json_kind(&value)
        )));
    };

    let mut batch = CandidateBatch::default();
    for (index, entry) in entries.iter().enumerate() {
        match candidate_from_value(entry) {
            Some(candidate) => batch.candidates.push(candidate),
            None => {
                warn!(index, entry = %entry, "Rejecting malformed candidate entry");
                batch.rejected += 1;
            }
        }
    }

    Ok(batch)
}

fn candidate_from_value(entry: &Value) -> Option<CompanyCandidate> {
    let field = |key: &str| {
        entry
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(CompanyCandidate {
        company_name: field("company_name")?,
        registered_name: field("registered_name")?,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
