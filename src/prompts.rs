//! Prompt definitions for the live suggestion provider.
//!
//! The system prompt fixes the response contract; the user prompt describes
//! one concrete funnel.

use crate::funnel::framework::{focus_for, is_fogg};
use crate::funnel::types::Step;

/// System prompt for whole-funnel analysis.
pub const FUNNEL_ANALYST_PROMPT: &str = r#"You are a conversion optimization expert. Analyze the entire funnel and give one specific, actionable suggestion for each step and framework combination.

Your response MUST be valid JSON in this exact format:
{
  "assessments": [
    {
      "stepIndex": 0,
      "frameworks": {
        "PAS": {"suggestion": "specific suggestion", "reasoning": "why it works", "confidence": 0.8, "estimated_uplift_pp": 2.5},
        "Fogg": {"suggestion": "specific suggestion", "reasoning": "why it works", "confidence": 0.7, "estimated_uplift_pp": 1.8, "motivation_score": 3.5, "trigger_score": 3.0}
      }
    }
  ]
}

Guidelines:
- Cover every step listed, using the stepIndex given for it
- Cover every framework requested, keyed by the exact framework name
- confidence must be between 0.0 and 1.0
- estimated_uplift_pp is the expected conversion change in percentage points
- For the Fogg framework also give motivation_score and trigger_score on a 1-5 scale

Always respond with valid JSON only, no other text."#;

/// User prompt describing the steps and the frameworks to apply.
///
/// `indices` are the resolved step indices, parallel to `steps`.
pub fn funnel_analysis_prompt(steps: &[Step], indices: &[usize], frameworks: &[String]) -> String {
    let steps_text: Vec<String> = steps
        .iter()
        .zip(indices)
        .enumerate()
        .map(|(position, (step, index))| {
            let mut labels = step.question_labels();
            if labels.is_empty() {
                labels.push(format!("Question {}", position + 1));
            }
            format!(
                "- stepIndex {}: {} (CR: {:.1}%)",
                index,
                labels.join(", "),
                step.observed_cr * 100.0
            )
        })
        .collect();

    let frameworks_text: Vec<String> = frameworks
        .iter()
        .map(|fw| {
            if is_fogg(fw) {
                format!("{} ({}; include motivation_score and trigger_score)", fw, focus_for(fw))
            } else {
                format!("{} ({})", fw, focus_for(fw))
            }
        })
        .collect();

    format!(
        "FUNNEL STEPS:\n{}\n\nFRAMEWORKS TO ANALYZE: {}",
        steps_text.join("\n"),
        frameworks_text.join(", ")
    )
}
