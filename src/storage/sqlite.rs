use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{Invocation, InvocationSummary, Storage, ToolCount};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// In-memory database on a single pinned connection.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn log_invocation(&self, invocation: &Invocation) -> StorageResult<()> {
        let input = serde_json::to_string(&invocation.input).unwrap_or_default();
        let output = invocation
            .output
            .as_ref()
            .map(|o| serde_json::to_string(o).unwrap_or_default());

        sqlx::query(
            r#"
            INSERT INTO invocations (id, tool_name, input, output, provider, latency_ms, success, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invocation.id)
        .bind(&invocation.tool_name)
        .bind(&input)
        .bind(&output)
        .bind(&invocation.provider)
        .bind(invocation.latency_ms)
        .bind(invocation.success)
        .bind(&invocation.error)
        .bind(invocation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_invocations(&self, tool_name: Option<&str>, limit: u32) -> StorageResult<Vec<Invocation>> {
        let rows: Vec<InvocationRow> = match tool_name {
            Some(tool_name) => {
                sqlx::query_as(
                    r#"
                    SELECT id, tool_name, input, output, provider, latency_ms, success, error, created_at
                    FROM invocations
                    WHERE tool_name = ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(tool_name)
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, tool_name, input, output, provider, latency_ms, success, error, created_at
                    FROM invocations
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Invocation::from).collect())
    }

    async fn get_invocation_summary(&self) -> StorageResult<InvocationSummary> {
        let (total, successful, avg_latency_ms): (i64, i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN success THEN 1 ELSE 0 END), 0), AVG(latency_ms)
            FROM invocations
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let by_tool: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT tool_name, COUNT(*) AS count, SUM(CASE WHEN success THEN 0 ELSE 1 END) AS failures
            FROM invocations
            GROUP BY tool_name
            ORDER BY count DESC, tool_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(InvocationSummary::new(
            total,
            successful,
            avg_latency_ms,
            by_tool
                .into_iter()
                .map(|(tool_name, count, failures)| ToolCount {
                    tool_name,
                    count,
                    failures,
                })
                .collect(),
        ))
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct InvocationRow {
    id: String,
    tool_name: String,
    input: String,
    output: Option<String>,
    provider: Option<String>,
    latency_ms: Option<i64>,
    success: bool,
    error: Option<String>,
    created_at: String,
}

impl From<InvocationRow> for Invocation {
    fn from(row: InvocationRow) -> Self {
        Self {
            id: row.id,
            tool_name: row.tool_name,
            input: serde_json::from_str(&row.input).unwrap_or(serde_json::Value::Null),
            output: row.output.and_then(|s| serde_json::from_str(&s).ok()),
            provider: row.provider,
            latency_ms: row.latency_ms,
            success: row.success,
            error: row.error,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_and_fetch_invocations() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();

        let first = Invocation::new("assessSteps", json!({"steps": [{"observedCR": 0.5}]}))
            .with_provider("mock")
            .success(json!({"baselineCR": 0.5}), 4);
        storage.log_invocation(&first).await.unwrap();
        storage
            .log_invocation(&Invocation::new("manusFunnel", json!({})).failure("bad input", 1))
            .await
            .unwrap();

        let all = storage.get_invocations(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let assess = storage.get_invocations(Some("assessSteps"), 10).await.unwrap();
        assert_eq!(assess.len(), 1);
        assert_eq!(assess[0].id, first.id);
        assert_eq!(assess[0].input, first.input);
        assert_eq!(assess[0].output, first.output);
        assert_eq!(assess[0].provider.as_deref(), Some("mock"));

        let limited = storage.get_invocations(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_summary() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();

        let empty = storage.get_invocation_summary().await.unwrap();
        assert_eq!(empty.total, 0);
        assert!(empty.avg_latency_ms.is_none());
        assert!(empty.by_tool.is_empty());

        for latency in [10, 20] {
            storage
                .log_invocation(&Invocation::new("assessSteps", json!({})).success(json!({}), latency))
                .await
                .unwrap();
        }
        storage
            .log_invocation(&Invocation::new("manusFunnel", json!({})).failure("x", 30))
            .await
            .unwrap();

        let summary = storage.get_invocation_summary().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.avg_latency_ms, Some(20.0));
        assert_eq!(summary.by_tool[0].tool_name, "assessSteps");
        assert_eq!(summary.by_tool[0].count, 2);
        assert_eq!(summary.by_tool[1].failures, 1);
    }
}
