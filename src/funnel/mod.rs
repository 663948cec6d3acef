//! Funnel scoring and reordering.
//!
//! The pipeline for one evaluation:
//!
//! 1. [`normalizer`] validates the steps and fills every missing
//!    (step, framework) suggestion from a [`FallbackPolicy`].
//! 2. [`uplift`] clamps each estimate to ±30 pp and aggregates per step.
//! 3. [`projector`] applies the uplifts and accumulates the conversion rate.
//! 4. [`fogg`] scores steps by motivation × ability × trigger and reorders them.
//! 5. [`ranker`] builds one variant per framework plus the Fogg variant and
//!    sorts them.
//!
//! [`FunnelEngine`] runs all of it. Everything here is synchronous and pure.

pub mod engine;
pub mod fogg;
pub mod framework;
pub mod normalizer;
pub mod projector;
pub mod ranker;
pub mod types;
pub mod uplift;

pub use engine::FunnelEngine;
pub use fogg::{FoggFallback, FoggScorer};
pub use framework::{FrameworkInfo, FRAMEWORKS};
pub use normalizer::{FallbackKind, FallbackPolicy};
pub use projector::{baseline_cr, Projection};
pub use types::{
    FoggAnalysis, FoggMetrics, FrameworkSuggestion, FunnelInput, FunnelReport,
    OrderRecommendation, Question, Step, StepAssessment, SuggestionTable, Variant,
    VariantSuggestion,
};
pub use uplift::{Aggregation, MAX_UPLIFT_PP};
