//! # LLM Response Parsing
//!
//! Converts free-form completion text into validated findings. The model is
//! asked for a JSON array, but output is untrusted: the parser extracts the
//! outermost array from surrounding prose, validates each element for
//! minimum-field presence, and drops individually invalid elements while
//! counting them. A response with no recoverable array at all is a
//! structural parse failure and is reported to the caller as an error.

use crate::models::{Effort, Finding, Priority};
use tracing::warn;

/// Structural failure to recover any findings from a response
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON array found in response")]
    NoJsonArray,

    #[error("malformed JSON array: {0}")]
    MalformedJson(String),
}

/// Findings recovered from one response, with the count of elements dropped
/// for failing validation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFindings {
    pub findings: Vec<Finding>,
    pub dropped: usize,
}

impl ParsedFindings {
    pub fn total(&self) -> usize {
        self.findings.len() + self.dropped
    }
}

/// Parse completion text into validated findings.
///
/// An empty array is a legitimate "no issues found" response, not a failure.
pub fn parse_findings(text: &str) -> Result<ParsedFindings, ParseError> {
    let start = text.find('[').ok_or(ParseError::NoJsonArray)?;
    let end = text.rfind(']').ok_or(ParseError::NoJsonArray)?;
    if end < start {
        return Err(ParseError::NoJsonArray);
    }

    let raw: Vec<serde_json::Value> = serde_json::from_str(&text[start..=end])
        .map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    let total = raw.len();
    let findings: Vec<Finding> = raw.into_iter().filter_map(parse_finding).collect();
    let dropped = total - findings.len();

    if dropped > 0 {
        warn!(dropped, kept = findings.len(), "Dropped invalid findings from response");
    }

    Ok(ParsedFindings { findings, dropped })
}

/// Validate one raw finding element. Returns `None` when minimum-field
/// presence is not satisfied.
fn parse_finding(value: serde_json::Value) -> Option<Finding> {
    let obj = value.as_object()?;

    let issue_type = non_empty_str(obj, "issue_type")?;
    let description = non_empty_str(obj, "description")?;
    let recommendation = non_empty_str(obj, "recommendation")?;

    let priority = obj
        .get("priority")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Priority>().ok())
        .unwrap_or(Priority::Medium);
    let effort = obj
        .get("effort")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Effort>().ok())
        .unwrap_or(Effort::Medium);

    let impact = obj
        .get("impact")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let estimated_improvement = obj
        .get("estimated_improvement")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from);

    let implementation_steps = obj
        .get("implementation_steps")
        .and_then(|v| v.as_array())
        .map(|steps| {
            steps
                .iter()
                .filter_map(|step| step.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let confidence_score = obj
        .get("confidence_score")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.7)
        .clamp(0.0, 1.0);

    Some(Finding {
        issue_type,
        priority,
        description,
        recommendation,
        impact,
        effort,
        estimated_improvement,
        implementation_steps,
        confidence_score,
    })
}

fn non_empty_str(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
