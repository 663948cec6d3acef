//! Integration tests for SQLite storage layer
//!
//! Tests the invocation log against in-memory and file-backed databases.

use serde_json::json;

use journey_funnel_mcp::config::DatabaseConfig;
use journey_funnel_mcp::storage::{Invocation, SqliteStorage, Storage};

/// Create an in-memory storage instance for testing
async fn create_test_storage() -> SqliteStorage {
    SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage")
}

#[cfg(test)]
mod invocation_tests {
    use super::*;

    #[tokio::test]
    async fn test_log_and_read_back() {
        let storage = create_test_storage().await;

        let invocation = Invocation::new("manusFunnel", json!({"frameworks": ["PAS"]}))
            .with_provider("mock")
            .success(json!({"baselineCR": 0.2}), 12);
        storage.log_invocation(&invocation).await.unwrap();

        let rows = storage.get_invocations(None, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, invocation.id);
        assert_eq!(row.tool_name, "manusFunnel");
        assert_eq!(row.input["frameworks"][0], "PAS");
        assert_eq!(row.output.as_ref().unwrap()["baselineCR"], 0.2);
        assert_eq!(row.provider.as_deref(), Some("mock"));
        assert_eq!(row.latency_ms, Some(12));
        assert!(row.success);
        assert!(row.error.is_none());
    }

    #[tokio::test]
    async fn test_filter_by_tool_and_limit() {
        let storage = create_test_storage().await;

        for i in 0..5 {
            let invocation = Invocation::new("assessSteps", json!({ "n": i })).success(json!({}), i);
            storage.log_invocation(&invocation).await.unwrap();
        }
        storage
            .log_invocation(&Invocation::new("listFrameworks", json!({})).success(json!({}), 1))
            .await
            .unwrap();

        let assess = storage.get_invocations(Some("assessSteps"), 3).await.unwrap();
        assert_eq!(assess.len(), 3);
        assert!(assess.iter().all(|i| i.tool_name == "assessSteps"));

        let all = storage.get_invocations(None, 100).await.unwrap();
        assert_eq!(all.len(), 6);
        // Newest first
        assert_eq!(all[0].tool_name, "listFrameworks");
    }

    #[tokio::test]
    async fn test_summary_counts_failures() {
        let storage = create_test_storage().await;

        storage
            .log_invocation(&Invocation::new("manusFunnel", json!({})).success(json!({}), 10))
            .await
            .unwrap();
        storage
            .log_invocation(&Invocation::new("manusFunnel", json!({})).failure("bad input", 30))
            .await
            .unwrap();
        storage
            .log_invocation(&Invocation::new("assessSteps", json!({})).success(json!({}), 20))
            .await
            .unwrap();

        let summary = storage.get_invocation_summary().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.avg_latency_ms, Some(20.0));
        assert_eq!(summary.by_tool[0].tool_name, "manusFunnel");
        assert_eq!(summary.by_tool[0].count, 2);
        assert_eq!(summary.by_tool[0].failures, 1);
    }

    #[tokio::test]
    async fn test_empty_summary() {
        let storage = create_test_storage().await;
        let summary = storage.get_invocation_summary().await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.avg_latency_ms.is_none());
        assert!(summary.by_tool.is_empty());
    }
}

#[cfg(test)]
mod file_storage_tests {
    use super::*;

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("funnel.db"),
            max_connections: 2,
        };

        {
            let storage = SqliteStorage::new(&config).await.unwrap();
            storage
                .log_invocation(&Invocation::new("assessSteps", json!({})).success(json!({}), 5))
                .await
                .unwrap();
        }

        let reopened = SqliteStorage::new(&config).await.unwrap();
        let rows = reopened.get_invocations(None, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(config.path.exists());
    }
}
