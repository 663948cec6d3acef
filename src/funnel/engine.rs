//! End-to-end funnel evaluation.

use tracing::{debug, info};

use super::fogg::{requested_fogg, FoggFallback, FoggScorer};
use super::normalizer::{normalize, validate, FallbackPolicy};
use super::projector::{baseline_cr, project};
use super::ranker::{fogg_variant, framework_variant, order_recommendations, rank_variants};
use super::types::{FunnelInput, FunnelReport};
use super::uplift::{step_uplifts, Aggregation};
use crate::error::ValidationError;

/// Stateless evaluator combining normalization, projection, Fogg scoring and ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunnelEngine {
    fallback: FallbackPolicy,
    fogg: FoggScorer,
}

impl Default for FunnelEngine {
    fn default() -> Self {
        Self::new(FallbackPolicy::standard())
    }
}

impl FunnelEngine {
    /// Create an engine that fills gaps from `fallback`.
    ///
    /// Fogg motivation and trigger defaults follow the same policy.
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            fallback,
            fogg: FoggScorer::new(FoggFallback {
                motivation: fallback.motivation,
                trigger: fallback.trigger,
            }),
        }
    }

    /// Override the motivation and trigger used for Fogg records that carry none.
    pub fn with_fogg_fallback(mut self, fallback: FoggFallback) -> Self {
        self.fogg = FoggScorer::new(fallback);
        self
    }

    pub fn fallback_policy(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Evaluate a funnel.
    ///
    /// Fails only on malformed input; missing suggestions are synthesized.
    pub fn evaluate(&self, input: &FunnelInput) -> Result<FunnelReport, ValidationError> {
        let steps = &input.steps;
        let frameworks = &input.frameworks;

        let indices = validate(steps, frameworks)?;
        let table = normalize(steps, frameworks, &input.suggestions, &self.fallback)?;

        let baseline = baseline_cr(steps);
        let uplifts = step_uplifts(&table, &indices, Aggregation::Averaged(frameworks));
        let projection = project(steps, &indices, &uplifts);

        let fogg_framework = requested_fogg(frameworks);
        let fogg = fogg_framework.map(|label| self.fogg.analyze(steps, &indices, &table, label));

        let mut variants: Vec<_> = frameworks
            .iter()
            .map(|fw| framework_variant(steps, &indices, &table, fw, baseline))
            .collect();
        let expected_cr: Vec<f64> = variants.iter().map(|v| v.cr_total).collect();

        if let (Some(framework), Some(analysis)) = (fogg_framework, fogg.as_ref()) {
            variants.push(fogg_variant(analysis, &table, &indices, framework));
        }

        let recommendations =
            order_recommendations(frameworks, &expected_cr, &table, &indices, fogg.as_ref());
        let variants = rank_variants(variants);

        debug!(
            steps = steps.len(),
            frameworks = frameworks.len(),
            variants = variants.len(),
            "Funnel evaluated"
        );
        if let Some(best) = variants.first() {
            info!(
                baseline_cr = baseline,
                predicted_cr_total = projection.predicted_cr_total,
                best_variant = %best.framework,
                best_uplift_pp = best.uplift_pp,
                "Ranked funnel variants"
            );
        }

        Ok(FunnelReport {
            baseline_cr: baseline,
            predicted_cr_total: projection.predicted_cr_total,
            assessments: projection.assessments,
            variants,
            order_recommendations: recommendations,
            fogg,
            suggestions: table,
        })
    }
}
