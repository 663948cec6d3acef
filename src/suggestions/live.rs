use async_trait::async_trait;
use tracing::{info, warn};

use super::parse::parse_assessments;
use super::{SuggestionBatch, SuggestionSource};
use crate::config::{LlmConfig, RequestConfig};
use crate::error::LlmResult;
use crate::funnel::normalizer::FallbackPolicy;
use crate::funnel::types::{Step, SuggestionTable};
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::prompts::{funnel_analysis_prompt, FUNNEL_ANALYST_PROMPT};

/// Provider asking a chat-completions model for the whole funnel in one call.
#[derive(Clone)]
pub struct LiveProvider {
    client: LlmClient,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl LiveProvider {
    pub fn new(config: &LlmConfig, request_config: RequestConfig) -> LlmResult<Self> {
        Ok(Self {
            client: LlmClient::new(config, request_config)?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    async fn request_table(
        &self,
        steps: &[Step],
        indices: &[usize],
        frameworks: &[String],
    ) -> LlmResult<SuggestionTable> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(FUNNEL_ANALYST_PROMPT),
                ChatMessage::user(funnel_analysis_prompt(steps, indices, frameworks)),
            ],
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self.client.chat(request).await?;
        let content = response.content().unwrap_or_default();
        parse_assessments(content, indices)
    }
}

#[async_trait]
impl SuggestionSource for LiveProvider {
    async fn fetch(&self, steps: &[Step], indices: &[usize], frameworks: &[String]) -> SuggestionBatch {
        if indices.is_empty() || frameworks.is_empty() {
            return SuggestionBatch {
                table: SuggestionTable::new(),
                policy: FallbackPolicy::standard(),
            };
        }

        match self.request_table(steps, indices, frameworks).await {
            Ok(table) => {
                info!(
                    steps = indices.len(),
                    frameworks = frameworks.len(),
                    records = table.len(),
                    "Received live suggestions"
                );
                SuggestionBatch {
                    table,
                    policy: FallbackPolicy::standard(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Live suggestions failed, using error fallback");
                SuggestionBatch {
                    table: SuggestionTable::new(),
                    policy: FallbackPolicy::error(),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "live"
    }
}
