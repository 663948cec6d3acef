//! Storage layer for the tool invocation log.
//!
//! Every MCP tool call is recorded with its input, output, provider and
//! latency so evaluations can be audited after the fact.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// Invocation log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Unique invocation identifier.
    pub id: String,
    /// Name of the MCP tool invoked.
    pub tool_name: String,
    /// Input parameters as JSON.
    pub input: serde_json::Value,
    /// Output result as JSON (if successful).
    pub output: Option<serde_json::Value>,
    /// Suggestion provider that served the call, if any.
    pub provider: Option<String>,
    pub latency_ms: Option<i64>,
    pub success: bool,
    /// Error message (if failed).
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invocation {
    /// Create a new invocation log entry
    pub fn new(tool_name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            input,
            output: None,
            provider: None,
            latency_ms: None,
            success: true,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Set the provider label
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Mark as successful with output
    pub fn success(mut self, output: serde_json::Value, latency_ms: i64) -> Self {
        self.success = true;
        self.output = Some(output);
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Mark as failed with error
    pub fn failure(mut self, error: impl Into<String>, latency_ms: i64) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Call count for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCount {
    pub tool_name: String,
    pub count: i64,
    pub failures: i64,
}

/// Aggregate view over the invocation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
    /// 0.0 when nothing has been logged.
    pub success_rate: f64,
    pub avg_latency_ms: Option<f64>,
    pub by_tool: Vec<ToolCount>,
}

impl InvocationSummary {
    pub fn new(total: i64, successful: i64, avg_latency_ms: Option<f64>, by_tool: Vec<ToolCount>) -> Self {
        let success_rate = if total > 0 {
            successful as f64 / total as f64
        } else {
            0.0
        };
        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
            avg_latency_ms,
            by_tool,
        }
    }
}

/// Persistence operations for the invocation log.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Record one invocation.
    async fn log_invocation(&self, invocation: &Invocation) -> StorageResult<()>;

    /// Most recent invocations first, optionally for one tool.
    async fn get_invocations(&self, tool_name: Option<&str>, limit: u32) -> StorageResult<Vec<Invocation>>;

    /// Totals, success rate, mean latency and per-tool counts.
    async fn get_invocation_summary(&self) -> StorageResult<InvocationSummary>;
}
