//! Suggestion providers.
//!
//! A provider turns a funnel into a [`SuggestionTable`] and names the
//! [`FallbackPolicy`] the engine should use for whatever it left out. The
//! provider is picked once, from configuration, and never changes afterwards.

mod live;
mod mock;
pub mod parse;

pub use live::LiveProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::funnel::normalizer::{validate, FallbackPolicy};
use crate::funnel::types::{FunnelInput, FunnelReport, Step, SuggestionTable};
use crate::funnel::FunnelEngine;

/// Provider label for requests whose suggestions came from the caller.
pub const SUPPLIED_PROVIDER: &str = "supplied";

/// Records from a provider plus the policy for filling gaps in them.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionBatch {
    pub table: SuggestionTable,
    pub policy: FallbackPolicy,
}

/// Source of per-step framework suggestions.
///
/// Fetching never fails; a provider that cannot produce suggestions returns
/// an empty table and the policy the engine fills it with.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Suggestions for every step in `indices` (parallel to `steps`).
    async fn fetch(&self, steps: &[Step], indices: &[usize], frameworks: &[String]) -> SuggestionBatch;

    /// Short provider label for logs and responses.
    fn name(&self) -> &'static str;
}

/// The provider the server runs with.
#[derive(Clone)]
pub enum SuggestionProvider {
    Live(LiveProvider),
    Mock(MockProvider),
}

impl SuggestionProvider {
    /// Build the provider selected by configuration.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        match (&config.llm, config.use_live_provider()) {
            (Some(llm), true) => Ok(Self::Live(LiveProvider::new(llm, config.request.clone())?)),
            _ => Ok(Self::Mock(MockProvider::new())),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

#[async_trait]
impl SuggestionSource for SuggestionProvider {
    async fn fetch(&self, steps: &[Step], indices: &[usize], frameworks: &[String]) -> SuggestionBatch {
        match self {
            Self::Live(provider) => provider.fetch(steps, indices, frameworks).await,
            Self::Mock(provider) => provider.fetch(steps, indices, frameworks).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Live(provider) => provider.name(),
            Self::Mock(provider) => provider.name(),
        }
    }
}

/// Funnel input with its suggestions resolved.
#[derive(Debug, Clone)]
pub struct Gathered {
    pub input: FunnelInput,
    pub policy: FallbackPolicy,
    /// `source.name()`, or [`SUPPLIED_PROVIDER`] when the caller's records were used.
    pub provider: &'static str,
}

/// A report plus the provider that produced its suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub report: FunnelReport,
    pub provider: &'static str,
}

/// Fill `input.suggestions` from `source` unless the caller already supplied some.
///
/// Caller records are used only when at least one parses; an object whose
/// steps are all empty falls through to `source`.
pub async fn gather<S>(source: &S, mut input: FunnelInput) -> Result<Gathered, ValidationError>
where
    S: SuggestionSource + ?Sized,
{
    let indices = validate(&input.steps, &input.frameworks)?;

    if !input.suggestions.is_empty() {
        debug!(
            records = input.suggestions.len(),
            "Using caller-supplied suggestions"
        );
        return Ok(Gathered {
            input,
            policy: FallbackPolicy::standard(),
            provider: SUPPLIED_PROVIDER,
        });
    }

    let batch = source
        .fetch(&input.steps, &indices, &input.frameworks)
        .await;
    input.suggestions = batch.table;
    Ok(Gathered {
        input,
        policy: batch.policy,
        provider: source.name(),
    })
}

/// Gather suggestions from `source` and evaluate the funnel.
pub async fn evaluate_with<S>(source: &S, input: FunnelInput) -> AppResult<Evaluation>
where
    S: SuggestionSource + ?Sized,
{
    let gathered = gather(source, input).await?;
    let report = FunnelEngine::new(gathered.policy)
        .evaluate(&gathered.input)
        .map_err(AppError::from)?;
    Ok(Evaluation {
        report,
        provider: gathered.provider,
    })
}
