//! # Journey Funnel MCP Server
//!
//! A Model Context Protocol (MCP) server that scores conversion funnels with
//! persuasion and usability frameworks and proposes better step orders.
//!
//! ## Features
//!
//! - **Suggestion normalization**: every (step, framework) pair gets a record,
//!   synthesized from a fallback policy when the provider left a gap
//! - **Uplift projection**: per-step uplifts clamped to ±30 pp and applied as
//!   a running conversion-rate product
//! - **Fogg scoring**: Motivation × Ability × Trigger per step and a
//!   recommended reordering
//! - **Variant ranking**: one variant per framework plus the Fogg reordering,
//!   sorted by uplift
//! - **Suggestion providers**: live chat-completions or deterministic mock
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (Rust) → Suggestion provider (HTTP or mock)
//!                    ↓                      ↓
//!            SQLite (audit log)      Funnel engine (pure)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use journey_funnel_mcp::{AppState, Config, McpServer};
//! use journey_funnel_mcp::storage::SqliteStorage;
//! use journey_funnel_mcp::suggestions::SuggestionProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let provider = SuggestionProvider::from_config(&config)?;
//!     let state = Arc::new(AppState::new(config, storage, provider));
//!     McpServer::new(state).run().await?;
//!     Ok(())
//! }
//! ```

/// Command-line interface.
pub mod cli;
/// Configuration management for the MCP server.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Funnel scoring engine.
pub mod funnel;
/// Chat-completions client.
pub mod llm;
/// Prompts for the live suggestion provider.
pub mod prompts;
/// MCP server implementation and request handling.
pub mod server;
/// SQLite invocation log.
pub mod storage;
/// Live and mock suggestion providers.
pub mod suggestions;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use funnel::{FunnelEngine, FunnelInput, FunnelReport};
pub use server::{AppState, McpServer, SharedState};
