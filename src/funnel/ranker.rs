//! Variant assembly and ranking.

use std::cmp::Ordering;

use super::framework::is_fogg;
use super::projector::{project, Projection};
use super::types::{
    FoggAnalysis, OrderRecommendation, Step, SuggestionTable, Variant, VariantSuggestion,
    FOGG_VARIANT_LABEL,
};
use super::uplift::{mean_uplift_pp, step_uplifts, Aggregation};

/// Variant confidence when there are no steps to average over.
pub const EMPTY_FUNNEL_CONFIDENCE: f64 = 0.5;

/// Relative uplift of `cr_total` over `baseline`, in percentage points.
///
/// A zero baseline has no meaningful ratio and reports 0.
pub fn relative_uplift_pp(cr_total: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (cr_total / baseline - 1.0) * 100.0
    } else {
        0.0
    }
}

fn framework_suggestions(
    table: &SuggestionTable,
    indices: &[usize],
    framework: &str,
) -> Vec<VariantSuggestion> {
    indices
        .iter()
        .filter_map(|&index| {
            table.get(index, framework).map(|s| VariantSuggestion {
                step_index: index,
                suggestion: s.suggestion.clone(),
                reasoning: s.reasoning.clone(),
                confidence: s.confidence.clamp(0.0, 1.0),
            })
        })
        .collect()
}

fn mean_confidence(suggestions: &[VariantSuggestion]) -> f64 {
    if suggestions.is_empty() {
        return EMPTY_FUNNEL_CONFIDENCE;
    }
    suggestions.iter().map(|s| s.confidence).sum::<f64>() / suggestions.len() as f64
}

/// Projection of the funnel under one framework's uplifts, original order.
pub fn framework_projection(
    steps: &[Step],
    indices: &[usize],
    table: &SuggestionTable,
    framework: &str,
) -> Projection {
    let uplifts = step_uplifts(table, indices, Aggregation::Single(framework));
    project(steps, indices, &uplifts)
}

/// Variant applying one framework's clamped uplifts, original order preserved.
pub fn framework_variant(
    steps: &[Step],
    indices: &[usize],
    table: &SuggestionTable,
    framework: &str,
    baseline: f64,
) -> Variant {
    let projection = framework_projection(steps, indices, table, framework);
    let suggestions = framework_suggestions(table, indices, framework);

    Variant {
        framework: framework.to_string(),
        step_order: (0..steps.len()).collect(),
        cr_total: projection.predicted_cr_total,
        uplift_pp: relative_uplift_pp(projection.predicted_cr_total, baseline),
        confidence: mean_confidence(&suggestions),
        suggestions,
        fogg_metrics: None,
    }
}

/// Synthetic variant that reorders steps by Fogg score.
pub fn fogg_variant(
    analysis: &FoggAnalysis,
    table: &SuggestionTable,
    indices: &[usize],
    fogg_framework: &str,
) -> Variant {
    let ordered: Vec<usize> = analysis
        .recommended_order
        .iter()
        .filter_map(|&position| indices.get(position).copied())
        .collect();
    let suggestions = framework_suggestions(table, &ordered, fogg_framework);

    Variant {
        framework: FOGG_VARIANT_LABEL.to_string(),
        step_order: analysis.recommended_order.clone(),
        cr_total: analysis.cr_total,
        uplift_pp: analysis.uplift_pp,
        confidence: mean_confidence(&suggestions),
        suggestions,
        fogg_metrics: Some(analysis.metrics.clone()),
    }
}

/// Sort descending by `uplift_pp`; equal uplifts keep their incoming order.
pub fn rank_variants(mut variants: Vec<Variant>) -> Vec<Variant> {
    variants.sort_by(|a, b| b.uplift_pp.partial_cmp(&a.uplift_pp).unwrap_or(Ordering::Equal));
    variants
}

/// One recommendation per framework, best expected CR first.
///
/// `expected_cr` supplies each framework's projected total in request order.
pub fn order_recommendations(
    frameworks: &[String],
    expected_cr: &[f64],
    table: &SuggestionTable,
    indices: &[usize],
    fogg: Option<&FoggAnalysis>,
) -> Vec<OrderRecommendation> {
    let identity: Vec<usize> = (0..indices.len()).collect();

    let mut recommendations: Vec<OrderRecommendation> = frameworks
        .iter()
        .zip(expected_cr)
        .map(|(framework, &expected_cr_total)| {
            let expected_uplift = mean_uplift_pp(table, indices, framework);
            let recommended_order = match fogg {
                Some(analysis) if is_fogg(framework) => {
                    analysis.recommended_order.clone()
                }
                _ => identity.clone(),
            };
            OrderRecommendation {
                framework: framework.clone(),
                recommended_order,
                expected_cr_total,
                expected_uplift,
                reasoning: format!(
                    "{} analysis suggests {:.1}pp improvement potential",
                    framework, expected_uplift
                ),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.expected_cr_total
            .partial_cmp(&a.expected_cr_total)
            .unwrap_or(Ordering::Equal)
    });
    recommendations
}
