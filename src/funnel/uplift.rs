//! Per-step uplift aggregation.
//!
//! Uplift estimates arrive in percentage points from an untrusted source.
//! They are clamped to the policy bound before anything else touches them.

use super::types::SuggestionTable;

/// Largest uplift, in percentage points, a single estimate may claim.
pub const MAX_UPLIFT_PP: f64 = 30.0;

/// How per-framework uplifts are combined for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation<'a> {
    /// Arithmetic mean over the requested frameworks present for the step.
    Averaged(&'a [String]),
    /// One framework's clamped value.
    Single(&'a str),
}

/// Clamp a percentage-point uplift to `[-MAX_UPLIFT_PP, MAX_UPLIFT_PP]`.
///
/// NaN counts as no uplift.
pub fn clamp_uplift_pp(pp: f64) -> f64 {
    if pp.is_nan() {
        return 0.0;
    }
    pp.clamp(-MAX_UPLIFT_PP, MAX_UPLIFT_PP)
}

/// Clamped uplift as a decimal fraction.
pub fn to_decimal(pp: f64) -> f64 {
    clamp_uplift_pp(pp) / 100.0
}

/// Clamped decimal uplift for one step.
///
/// A step with no matching records yields 0. Negative results are returned as is.
pub fn step_uplift(table: &SuggestionTable, step_index: usize, mode: Aggregation<'_>) -> f64 {
    match mode {
        Aggregation::Single(framework) => table
            .get(step_index, framework)
            .map(|s| to_decimal(s.estimated_uplift_pp))
            .unwrap_or(0.0),
        Aggregation::Averaged(frameworks) => {
            let values: Vec<f64> = frameworks
                .iter()
                .filter_map(|fw| table.get(step_index, fw))
                .map(|s| to_decimal(s.estimated_uplift_pp))
                .collect();
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
    }
}

/// Clamped decimal uplift for each step, in input order.
pub fn step_uplifts(table: &SuggestionTable, indices: &[usize], mode: Aggregation<'_>) -> Vec<f64> {
    indices
        .iter()
        .map(|&index| step_uplift(table, index, mode))
        .collect()
}

/// Mean clamped uplift of one framework across steps, in percentage points.
pub fn mean_uplift_pp(table: &SuggestionTable, indices: &[usize], framework: &str) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let total: f64 = indices
        .iter()
        .map(|&index| step_uplift(table, index, Aggregation::Single(framework)) * 100.0)
        .sum();
    total / indices.len() as f64
}
