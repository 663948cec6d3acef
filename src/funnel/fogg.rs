//! Fogg Behavior Model scoring and step reordering.
//!
//! Each step gets `fogg_score = motivation × ability × trigger`, with every
//! term on a 1-5 scale:
//!
//! ```text
//! SC      = mean(Qs, Is, Ds)                                  if any is declared
//!         = min(5, 1.5 × |questions| + Σ (inv + diff) / 2)     else if questions exist
//!         = 0                                                  otherwise
//! ability = clamp(1, 5, 6 − SC)
//! ```
//!
//! Steps are then reordered highest score first. The two complexity sources
//! are alternatives and are never blended.

use super::framework::is_fogg;
use super::projector::{baseline_cr, clamp_cr, ordered_cr};
use super::types::{FoggAnalysis, FoggMetrics, Step, SuggestionTable};
use super::uplift::clamp_uplift_pp;

/// Complexity ceiling.
pub const MAX_COMPLEXITY: f64 = 5.0;

/// Complexity contributed by each question before its own attributes.
pub const COMPLEXITY_PER_QUESTION: f64 = 1.5;

/// Lower bound of motivation, ability and trigger.
pub const MIN_TERM: f64 = 1.0;

/// Upper bound of motivation, ability and trigger.
pub const MAX_TERM: f64 = 5.0;

/// Largest possible `fogg_score`.
pub const MAX_FOGG_SCORE: f64 = MAX_TERM * MAX_TERM * MAX_TERM;

/// Percentage points added at a perfect mean Fogg score.
pub const CONFIDENCE_BONUS_PP: f64 = 1.5;

/// Motivation and trigger used when the Fogg record carries none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoggFallback {
    pub motivation: f64,
    pub trigger: f64,
}

impl Default for FoggFallback {
    fn default() -> Self {
        Self {
            motivation: 3.0,
            trigger: 3.0,
        }
    }
}

/// Scores steps and derives the recommended ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FoggScorer {
    fallback: FoggFallback,
}

/// Step complexity (SC_s).
pub fn step_complexity(step: &Step) -> f64 {
    if step.has_declared_complexity() {
        let declared = [step.qs, step.is, step.ds]
            .iter()
            .map(|v| v.unwrap_or(0.0).max(0.0))
            .sum::<f64>();
        return declared / 3.0;
    }

    if step.questions.is_empty() {
        return 0.0;
    }

    let attributes: f64 = step
        .questions
        .iter()
        .filter_map(|q| match (q.invasiveness, q.difficulty) {
            (Some(inv), Some(diff)) => Some((inv.max(0.0) + diff.max(0.0)) / 2.0),
            _ => None,
        })
        .sum();

    let base = COMPLEXITY_PER_QUESTION * step.questions.len() as f64 + attributes;
    base.min(MAX_COMPLEXITY)
}

/// Ability term, decreasing in complexity.
pub fn ability(complexity: f64) -> f64 {
    clamp_term(6.0 - complexity)
}

/// Clamp a motivation, ability or trigger value into `[1, 5]`.
pub fn clamp_term(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_TERM;
    }
    value.clamp(MIN_TERM, MAX_TERM)
}

/// Step positions sorted descending by score, ties by position.
pub fn recommended_order(metrics: &[FoggMetrics]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..metrics.len()).collect();
    // sort_by is stable, so equal scores keep ascending positions
    order.sort_by(|&a, &b| {
        metrics[b]
            .fogg_score
            .partial_cmp(&metrics[a].fogg_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(position, &step)| position == step)
}

impl FoggScorer {
    pub fn new(fallback: FoggFallback) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> FoggFallback {
        self.fallback
    }

    /// Compute Fogg terms for each step, in input order.
    ///
    /// Motivation and trigger come from the record stored under `label`.
    pub fn score(
        &self,
        steps: &[Step],
        indices: &[usize],
        table: &SuggestionTable,
        label: &str,
    ) -> Vec<FoggMetrics> {
        steps
            .iter()
            .zip(indices)
            .map(|(step, &step_index)| {
                let record = table.fogg(step_index, label);
                let motivation = clamp_term(
                    record
                        .and_then(|r| r.motivation_score)
                        .unwrap_or(self.fallback.motivation),
                );
                let trigger = clamp_term(
                    record
                        .and_then(|r| r.trigger_score)
                        .unwrap_or(self.fallback.trigger),
                );
                let complexity = step_complexity(step);
                let ability = ability(complexity);

                FoggMetrics {
                    step_index,
                    motivation,
                    ability,
                    trigger,
                    fogg_score: motivation * ability * trigger,
                    complexity,
                }
            })
            .collect()
    }

    /// Score, reorder and estimate the uplift of the reordering.
    ///
    /// An unchanged order (always the case for zero or one step) has no uplift.
    pub fn analyze(
        &self,
        steps: &[Step],
        indices: &[usize],
        table: &SuggestionTable,
        label: &str,
    ) -> FoggAnalysis {
        let metrics = self.score(steps, indices, table, label);
        let order = recommended_order(&metrics);
        let baseline = baseline_cr(steps);
        let reordered = ordered_cr(steps, &order);

        let uplift_pp = if is_identity(&order) {
            0.0
        } else {
            let mean_score =
                metrics.iter().map(|m| m.fogg_score).sum::<f64>() / metrics.len() as f64;
            let bonus = (mean_score / MAX_FOGG_SCORE) * CONFIDENCE_BONUS_PP;
            clamp_uplift_pp((reordered - baseline) * 100.0 + bonus)
        };

        FoggAnalysis {
            metrics,
            recommended_order: order,
            reordered_cr: reordered,
            uplift_pp,
            cr_total: clamp_cr(baseline * (1.0 + uplift_pp / 100.0)),
        }
    }
}

/// Framework identifier the Fogg variant draws suggestions from, if requested.
pub fn requested_fogg(frameworks: &[String]) -> Option<&str> {
    frameworks
        .iter()
        .map(String::as_str)
        .find(|fw| is_fogg(fw))
}
