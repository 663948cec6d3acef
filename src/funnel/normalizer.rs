//! Suggestion record normalization.
//!
//! Every (step, framework) pair the engine looks at must have a record.
//! Gaps left by the suggestion provider are filled here, and only here, from
//! a [`FallbackPolicy`] chosen by the provider that produced the table.

use std::collections::HashSet;
use tracing::debug;

use super::framework::{focus_for, is_fogg};
use super::types::{FrameworkSuggestion, Step, SuggestionTable};
use crate::error::ValidationError;

/// Which wording fallback records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Gap in an otherwise successful live response.
    Standard,
    /// Deterministic offline suggestions.
    Mock,
    /// The live provider failed outright.
    Error,
}

/// Values used to synthesize a missing suggestion record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPolicy {
    pub kind: FallbackKind,
    pub confidence: f64,
    pub estimated_uplift_pp: f64,
    /// Fogg motivation attached to synthesized Fogg records.
    pub motivation: f64,
    /// Fogg trigger attached to synthesized Fogg records.
    pub trigger: f64,
}

impl FallbackPolicy {
    pub fn standard() -> Self {
        Self {
            kind: FallbackKind::Standard,
            confidence: 0.7,
            estimated_uplift_pp: 1.5,
            motivation: 3.0,
            trigger: 3.0,
        }
    }

    pub fn mock() -> Self {
        Self {
            kind: FallbackKind::Mock,
            confidence: 0.8,
            estimated_uplift_pp: 2.0,
            motivation: 3.5,
            trigger: 3.0,
        }
    }

    pub fn error() -> Self {
        Self {
            kind: FallbackKind::Error,
            confidence: 0.5,
            estimated_uplift_pp: 1.0,
            motivation: 3.0,
            trigger: 3.0,
        }
    }

    /// Synthesize the record for `framework` at step `position` (zero-based).
    pub fn record(&self, framework: &str, position: usize) -> FrameworkSuggestion {
        let (suggestion, reasoning) = match self.kind {
            FallbackKind::Standard => (
                format!("{} optimization suggestion", framework),
                format!("Based on {} principles", framework),
            ),
            FallbackKind::Mock => {
                let focus = focus_for(framework);
                (
                    format!(
                        "[Mock] {} optimization for step {}: focus on {}",
                        framework,
                        position + 1,
                        focus
                    ),
                    format!("[Mock] Based on {} principles: {}", framework, focus),
                )
            }
            FallbackKind::Error => (
                format!("Error generating {} suggestion - using fallback", framework),
                format!("Technical error occurred, using {} best practices", framework),
            ),
        };

        let record = FrameworkSuggestion::new(
            framework,
            suggestion,
            reasoning,
            self.confidence,
            self.estimated_uplift_pp,
        );

        if is_fogg(framework) {
            record.with_fogg_scores(self.motivation, self.trigger)
        } else {
            record
        }
    }

}

/// Reject malformed steps and framework identifiers.
///
/// Returns the resolved step index for each step, in input order.
pub fn validate(steps: &[Step], frameworks: &[String]) -> Result<Vec<usize>, ValidationError> {
    for (i, framework) in frameworks.iter().enumerate() {
        if framework.trim().is_empty() {
            return Err(ValidationError::new(
                format!("frameworks[{}]", i),
                "framework identifier cannot be empty",
            ));
        }
    }

    let mut seen = HashSet::with_capacity(steps.len());
    let mut indices = Vec::with_capacity(steps.len());

    for (position, step) in steps.iter().enumerate() {
        let index = step.resolved_index(position).ok_or_else(|| {
            ValidationError::new(
                format!("steps[{}].stepIndex", position),
                format!(
                    "must be a non-negative integer (got {})",
                    step.index.unwrap_or_default()
                ),
            )
        })?;

        if !seen.insert(index) {
            return Err(ValidationError::new(
                format!("steps[{}].stepIndex", position),
                format!("duplicate step index {}", index),
            ));
        }
        indices.push(index);
    }

    Ok(indices)
}

/// Produce a table covering every (step, framework) pair.
///
/// Present records are kept untouched, including records for frameworks that
/// were not requested. A missing Fogg label is filled from a record stored
/// under another spelling of "Fogg" before falling back to `policy`.
pub fn normalize(
    steps: &[Step],
    frameworks: &[String],
    table: &SuggestionTable,
    policy: &FallbackPolicy,
) -> Result<SuggestionTable, ValidationError> {
    let indices = validate(steps, frameworks)?;
    let mut complete = table.clone();
    let mut filled = 0usize;

    for (position, &index) in indices.iter().enumerate() {
        for framework in frameworks {
            if complete.contains(index, framework) {
                continue;
            }
            let record = match complete.fogg(index, framework) {
                Some(supplied) if is_fogg(framework) => FrameworkSuggestion {
                    framework: framework.clone(),
                    ..supplied.clone()
                },
                _ => {
                    filled += 1;
                    policy.record(framework, position)
                }
            };
            complete.insert(index, record);
        }
    }

    if filled > 0 {
        debug!(
            filled,
            fallback = ?policy.kind,
            "Filled missing suggestion records"
        );
    }

    Ok(complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frameworks(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn three_steps() -> Vec<Step> {
        vec![Step::new(0.9), Step::new(0.7), Step::new(0.5)]
    }

    #[test]
    fn test_missing_jtbd_gets_standard_fallback() {
        let steps = three_steps();
        let fws = frameworks(&["PAS", "JTBD"]);
        let mut table = SuggestionTable::new();
        for index in 0..3 {
            table.insert(index, FrameworkSuggestion::new("PAS", "p", "r", 0.9, 4.0));
        }
        table.insert(0, FrameworkSuggestion::new("JTBD", "j", "r", 0.9, 4.0));
        table.insert(1, FrameworkSuggestion::new("JTBD", "j", "r", 0.9, 4.0));

        let complete = normalize(&steps, &fws, &table, &FallbackPolicy::standard()).unwrap();

        let filled = complete.get(2, "JTBD").unwrap();
        assert!(filled.suggestion.contains("JTBD"));
        assert!(filled.reasoning.contains("JTBD"));
        assert_eq!(filled.confidence, 0.7);
        assert_eq!(filled.estimated_uplift_pp, 1.5);
        assert!(filled.motivation_score.is_none());
    }

    #[test]
    fn test_present_entries_untouched() {
        let steps = three_steps();
        let fws = frameworks(&["PAS"]);
        let original = FrameworkSuggestion::new("PAS", "keep me", "because", 0.1, 99.0);
        let extra = FrameworkSuggestion::new("AIDA", "not requested", "still kept", 0.3, 1.0);
        let table = SuggestionTable::new()
            .with(1, original.clone())
            .with(1, extra.clone());

        let complete = normalize(&steps, &fws, &table, &FallbackPolicy::standard()).unwrap();

        assert_eq!(complete.get(1, "PAS"), Some(&original));
        assert_eq!(complete.get(1, "AIDA"), Some(&extra));
        assert_eq!(complete.len(), 4);
    }

    #[test]
    fn test_mock_policy_values() {
        let steps = vec![Step::new(0.6)];
        let fws = frameworks(&["Fogg", "PAS"]);
        let complete =
            normalize(&steps, &fws, &SuggestionTable::new(), &FallbackPolicy::mock()).unwrap();

        let fogg = complete.get(0, "Fogg").unwrap();
        assert_eq!(fogg.confidence, 0.8);
        assert_eq!(fogg.estimated_uplift_pp, 2.0);
        assert_eq!(fogg.motivation_score, Some(3.5));
        assert_eq!(fogg.trigger_score, Some(3.0));
        assert!(fogg.suggestion.starts_with("[Mock] Fogg"));
        assert!(fogg.suggestion.contains("step 1"));

        let pas = complete.get(0, "PAS").unwrap();
        assert!(pas.motivation_score.is_none());
        assert!(pas.reasoning.contains("emotional triggers"));
    }

    #[test]
    fn test_fogg_spelling_reuses_supplied_record() {
        let steps = vec![Step::new(0.6), Step::new(0.5)];
        let table = SuggestionTable::new()
            .with(0, FrameworkSuggestion::new("fogg", "nudge", "r", 0.9, 3.0).with_fogg_scores(5.0, 4.0));

        let complete =
            normalize(&steps, &frameworks(&["Fogg"]), &table, &FallbackPolicy::standard()).unwrap();

        let aliased = complete.get(0, "Fogg").unwrap();
        assert_eq!(aliased.framework, "Fogg");
        assert_eq!(aliased.suggestion, "nudge");
        assert_eq!(aliased.motivation_score, Some(5.0));
        assert_eq!(complete.get(0, "fogg"), table.get(0, "fogg"));

        // No supplied record at step 1, so the policy fills it
        assert_eq!(complete.get(1, "Fogg").unwrap().motivation_score, Some(3.0));
    }

    #[test]
    fn test_standard_fogg_fallback_scores() {
        let record = FallbackPolicy::standard().record("Fogg", 0);
        assert_eq!(record.motivation_score, Some(3.0));
        assert_eq!(record.trigger_score, Some(3.0));
    }

    #[test]
    fn test_error_policy_wording() {
        let record = FallbackPolicy::error().record("ELM", 4);
        assert_eq!(record.suggestion, "Error generating ELM suggestion - using fallback");
        assert_eq!(record.confidence, 0.5);
        assert_eq!(record.estimated_uplift_pp, 1.0);
    }

    #[test]
    fn test_explicit_indices_used_as_keys() {
        let steps = vec![Step::new(0.5).with_index(10), Step::new(0.5).with_index(3)];
        let fws = frameworks(&["PAS"]);
        let complete =
            normalize(&steps, &fws, &SuggestionTable::new(), &FallbackPolicy::standard()).unwrap();
        assert!(complete.contains(10, "PAS"));
        assert!(complete.contains(3, "PAS"));
        assert!(!complete.contains(0, "PAS"));
    }

    #[test]
    fn test_negative_step_index_rejected() {
        let steps = vec![Step::new(0.5), Step::new(0.5).with_index(-2)];
        let err = normalize(
            &steps,
            &frameworks(&["PAS"]),
            &SuggestionTable::new(),
            &FallbackPolicy::standard(),
        )
        .unwrap_err();
        assert_eq!(err.field, "steps[1].stepIndex");
        assert!(err.reason.contains("-2"));
    }

    #[test]
    fn test_duplicate_step_index_rejected() {
        let steps = vec![Step::new(0.5).with_index(1), Step::new(0.5)];
        let err = validate(&steps, &frameworks(&["PAS"])).unwrap_err();
        assert_eq!(err.field, "steps[1].stepIndex");
        assert!(err.reason.contains("duplicate"));
    }

    #[test]
    fn test_empty_framework_rejected() {
        let err = validate(&three_steps(), &frameworks(&["PAS", "  "])).unwrap_err();
        assert_eq!(err.field, "frameworks[1]");
    }

    #[test]
    fn test_degenerate_inputs_are_not_errors() {
        let empty = normalize(&[], &[], &SuggestionTable::new(), &FallbackPolicy::standard());
        assert!(empty.unwrap().is_empty());

        let no_frameworks =
            normalize(&three_steps(), &[], &SuggestionTable::new(), &FallbackPolicy::standard());
        assert!(no_frameworks.unwrap().is_empty());
    }
}
