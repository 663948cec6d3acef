//! Cumulative conversion-rate projection.

use super::types::{Step, StepAssessment};
use super::uplift::MAX_UPLIFT_PP;

/// Step-wise projection plus the final product.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub assessments: Vec<StepAssessment>,
    pub predicted_cr_total: f64,
}

/// Clamp a conversion rate into `[0, 1]`; NaN becomes 0.
pub fn clamp_cr(cr: f64) -> f64 {
    if cr.is_nan() {
        return 0.0;
    }
    cr.clamp(0.0, 1.0)
}

/// Product of observed conversion rates in input order. 1.0 for an empty funnel.
pub fn baseline_cr(steps: &[Step]) -> f64 {
    steps.iter().map(|s| clamp_cr(s.observed_cr)).product()
}

/// Product of observed conversion rates visited in `order` (step positions).
pub fn ordered_cr(steps: &[Step], order: &[usize]) -> f64 {
    order
        .iter()
        .filter_map(|&position| steps.get(position))
        .map(|s| clamp_cr(s.observed_cr))
        .product()
}

/// Apply one decimal uplift per step and accumulate the running product.
///
/// `indices` and `uplifts` are parallel to `steps`. The cumulative value is
/// seeded at 1.0 on every call.
pub fn project(steps: &[Step], indices: &[usize], uplifts: &[f64]) -> Projection {
    debug_assert_eq!(steps.len(), indices.len());
    debug_assert_eq!(steps.len(), uplifts.len());

    let bound = MAX_UPLIFT_PP / 100.0;
    let mut cumulative = 1.0;
    let mut assessments = Vec::with_capacity(steps.len());

    for ((step, &step_index), &raw_uplift) in steps.iter().zip(indices).zip(uplifts) {
        let uplift = if raw_uplift.is_nan() {
            0.0
        } else {
            raw_uplift.clamp(-bound, bound)
        };
        let base_cr = clamp_cr(step.observed_cr);
        let new_cr = clamp_cr(base_cr + uplift);
        cumulative *= new_cr;

        assessments.push(StepAssessment {
            step_index,
            base_cr,
            uplift,
            new_cr,
            cumulative_cr: cumulative,
        });
    }

    Projection {
        assessments,
        predicted_cr_total: cumulative,
    }
}
