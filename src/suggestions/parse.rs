//! Parsing of model completions into suggestion tables.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::funnel::types::{FrameworkSuggestion, SuggestionTable};

#[derive(Debug, Deserialize)]
struct AssessmentEnvelope {
    #[serde(default)]
    assessments: Vec<StepSuggestions>,
}

#[derive(Debug, Deserialize)]
struct StepSuggestions {
    #[serde(rename = "stepIndex", default)]
    step_index: Option<i64>,
    #[serde(default)]
    frameworks: BTreeMap<String, FrameworkSuggestion>,
}

/// Extract JSON from a completion that may be wrapped in markdown fences.
///
/// Tries, in order: raw JSON, a ```json block, a bare ``` block.
pub fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}

/// Drop ASCII control characters other than newline, carriage return and tab.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Parse an `{"assessments": [...]}` completion into a table.
///
/// An entry without `stepIndex` is matched to the step at its array position.
/// Entries for steps outside `indices` are dropped.
pub fn parse_assessments(completion: &str, indices: &[usize]) -> LlmResult<SuggestionTable> {
    let cleaned = strip_control_chars(completion);
    let json = extract_json_from_completion(&cleaned)
        .map_err(|message| LlmError::InvalidResponse { message })?;

    let envelope: AssessmentEnvelope =
        serde_json::from_str(json).map_err(|e| LlmError::InvalidResponse {
            message: format!("Failed to parse assessments: {}", e),
        })?;

    let mut table = SuggestionTable::new();
    let mut dropped = 0usize;

    for (position, entry) in envelope.assessments.into_iter().enumerate() {
        let step_index = match entry.step_index {
            Some(index) => usize::try_from(index).ok(),
            None => indices.get(position).copied(),
        };

        let Some(step_index) = step_index.filter(|i| indices.contains(i)) else {
            dropped += 1;
            continue;
        };

        for (framework, mut suggestion) in entry.frameworks {
            suggestion.framework = framework;
            table.insert(step_index, suggestion);
        }
    }

    if dropped > 0 {
        debug!(dropped, "Ignored assessments for unknown steps");
    }

    Ok(table)
}
