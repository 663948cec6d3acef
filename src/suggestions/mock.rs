use async_trait::async_trait;
use tracing::debug;

use super::{SuggestionBatch, SuggestionSource};
use crate::funnel::normalizer::FallbackPolicy;
use crate::funnel::types::{Step, SuggestionTable};

/// Offline provider producing deterministic suggestions.
///
/// It returns no records of its own; the mock policy fills every pair during
/// normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SuggestionSource for MockProvider {
    async fn fetch(&self, _steps: &[Step], indices: &[usize], frameworks: &[String]) -> SuggestionBatch {
        debug!(
            steps = indices.len(),
            frameworks = frameworks.len(),
            "Generating mock suggestions"
        );
        SuggestionBatch {
            table: SuggestionTable::new(),
            policy: FallbackPolicy::mock(),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
