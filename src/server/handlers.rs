use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use super::SharedState;
use crate::error::{AppError, McpError, McpResult};
use crate::funnel::types::{
    FoggAnalysis, FrameworkSuggestion, FunnelInput, FunnelReport, OrderRecommendation, Variant,
};
use crate::funnel::FRAMEWORKS;
use crate::storage::{Invocation, Storage};
use crate::suggestions::evaluate_with;

const DEFAULT_METRICS_LIMIT: u32 = 20;
const MAX_METRICS_LIMIT: u32 = 100;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    let input = arguments.clone().unwrap_or(Value::Null);
    let start = Instant::now();

    let (result, provider) = match tool_name {
        "assessSteps" => split_provider(handle_assess_steps(state, arguments).await),
        "manusFunnel" => split_provider(handle_manus_funnel(state, arguments).await),
        "listFrameworks" => (handle_list_frameworks(), None),
        // Reading the log is not itself logged
        "invocationMetrics" => return handle_invocation_metrics(state, arguments).await,
        _ => {
            return Err(McpError::UnknownTool {
                tool_name: tool_name.to_string(),
            })
        }
    };

    record_invocation(state, tool_name, input, provider, &result, start).await;
    result
}

/// Separate a funnel tool's output from the provider that served it.
///
/// Failed calls never reached a provider and carry none.
fn split_provider(
    served: McpResult<(Value, &'static str)>,
) -> (McpResult<Value>, Option<&'static str>) {
    match served {
        Ok((output, provider)) => (Ok(output), Some(provider)),
        Err(e) => (Err(e), None),
    }
}

async fn record_invocation(
    state: &SharedState,
    tool_name: &str,
    input: Value,
    provider: Option<&str>,
    result: &McpResult<Value>,
    start: Instant,
) {
    let latency_ms = start.elapsed().as_millis() as i64;
    let mut invocation = Invocation::new(tool_name, input);
    if let Some(provider) = provider {
        invocation = invocation.with_provider(provider);
    }
    let invocation = match result {
        Ok(output) => invocation.success(output.clone(), latency_ms),
        Err(e) => invocation.failure(e.to_string(), latency_ms),
    };

    if let Err(e) = state.storage.log_invocation(&invocation).await {
        warn!(tool = %tool_name, error = %e, "Failed to log invocation");
    }
}

/// One assessed step in the `assessSteps` response.
#[derive(Debug, Serialize)]
pub struct AssessedStep {
    #[serde(rename = "stepIndex")]
    pub step_index: usize,
    #[serde(rename = "observedCR")]
    pub observed_cr: f64,
    pub frameworks: BTreeMap<String, FrameworkSuggestion>,
    /// Averaged, clamped decimal uplift applied to the step.
    pub estimated_uplift: f64,
    #[serde(rename = "new_CR")]
    pub new_cr: f64,
    #[serde(rename = "cumulative_CR")]
    pub cumulative_cr: f64,
}

/// Response of the `assessSteps` tool.
#[derive(Debug, Serialize)]
pub struct AssessStepsResponse {
    pub assessments: Vec<AssessedStep>,
    #[serde(rename = "baselineCR")]
    pub baseline_cr: f64,
    #[serde(rename = "predicted_CR_total")]
    pub predicted_cr_total: f64,
    pub order_recommendations: Vec<OrderRecommendation>,
    pub frameworks_used: Vec<String>,
    pub provider: &'static str,
    pub timestamp: String,
}

impl AssessStepsResponse {
    fn from_report(report: FunnelReport, frameworks: Vec<String>, provider: &'static str) -> Self {
        let assessments = report
            .assessments
            .iter()
            .map(|a| AssessedStep {
                step_index: a.step_index,
                observed_cr: a.base_cr,
                frameworks: frameworks
                    .iter()
                    .filter_map(|fw| {
                        report
                            .suggestions
                            .get(a.step_index, fw)
                            .map(|s| (fw.clone(), s.clone()))
                    })
                    .collect(),
                estimated_uplift: a.uplift,
                new_cr: a.new_cr,
                cumulative_cr: a.cumulative_cr,
            })
            .collect();

        Self {
            assessments,
            baseline_cr: report.baseline_cr,
            predicted_cr_total: report.predicted_cr_total,
            order_recommendations: report.order_recommendations,
            frameworks_used: frameworks,
            provider,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Summary block of the `manusFunnel` response.
#[derive(Debug, Serialize)]
pub struct FunnelMeta {
    pub steps_analyzed: usize,
    pub frameworks_used: usize,
    pub total_suggestions: usize,
    pub provider: &'static str,
}

/// Response of the `manusFunnel` tool.
#[derive(Debug, Serialize)]
pub struct ManusFunnelResponse {
    #[serde(rename = "baselineCR")]
    pub baseline_cr: f64,
    #[serde(rename = "predicted_CR_total")]
    pub predicted_cr_total: f64,
    pub variants: Vec<Variant>,
    pub order_recommendations: Vec<OrderRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fogg: Option<FoggAnalysis>,
    pub meta: FunnelMeta,
    pub timestamp: String,
}

impl ManusFunnelResponse {
    fn from_report(
        report: FunnelReport,
        steps: usize,
        frameworks: usize,
        provider: &'static str,
    ) -> Self {
        let total_suggestions = report.variants.iter().map(|v| v.suggestions.len()).sum();
        Self {
            baseline_cr: report.baseline_cr,
            predicted_cr_total: report.predicted_cr_total,
            variants: report.variants,
            order_recommendations: report.order_recommendations,
            fogg: report.fogg,
            meta: FunnelMeta {
                steps_analyzed: steps,
                frameworks_used: frameworks,
                total_suggestions,
                provider,
            },
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Handle assessSteps tool call
async fn handle_assess_steps(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<(Value, &'static str)> {
    let response = execute_handler("assessSteps", arguments, |input: FunnelInput| async move {
        let frameworks = input.frameworks.clone();
        let evaluation = evaluate_with(&state.provider, input).await?;
        Ok::<_, AppError>(AssessStepsResponse::from_report(
            evaluation.report,
            frameworks,
            evaluation.provider,
        ))
    })
    .await?;

    Ok((to_output(&response)?, response.provider))
}

/// Handle manusFunnel tool call
async fn handle_manus_funnel(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<(Value, &'static str)> {
    let response = execute_handler("manusFunnel", arguments, |input: FunnelInput| async move {
        let steps = input.steps.len();
        let frameworks = input.frameworks.len();
        let evaluation = evaluate_with(&state.provider, input).await?;
        let report = evaluation.report;
        info!(
            variants = report.variants.len(),
            top = report.variants.first().map(|v| v.framework.as_str()).unwrap_or("none"),
            provider = evaluation.provider,
            "Funnel variants generated"
        );
        Ok::<_, AppError>(ManusFunnelResponse::from_report(
            report,
            steps,
            frameworks,
            evaluation.provider,
        ))
    })
    .await?;

    Ok((to_output(&response)?, response.meta.provider))
}

/// Handle listFrameworks tool call
fn handle_list_frameworks() -> McpResult<Value> {
    Ok(serde_json::json!({ "frameworks": FRAMEWORKS }))
}

#[derive(Debug, Default, Deserialize)]
struct MetricsParams {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

/// Handle invocationMetrics tool call
async fn handle_invocation_metrics(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: MetricsParams = match arguments {
        Some(Value::Null) | None => MetricsParams::default(),
        args => parse_arguments("invocationMetrics", args)?,
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_METRICS_LIMIT)
        .clamp(1, MAX_METRICS_LIMIT);

    let summary = state
        .storage
        .get_invocation_summary()
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;
    let recent = state
        .storage
        .get_invocations(params.tool_name.as_deref(), limit)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    Ok(serde_json::json!({
        "summary": summary,
        "recent": recent,
    }))
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Parse typed arguments and run the operation.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<R>
where
    P: serde::de::DeserializeOwned,
    E: std::fmt::Display,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    operation(params)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })
}

fn to_output<R: Serialize>(response: &R) -> McpResult<Value> {
    serde_json::to_value(response).map_err(McpError::Json)
}
