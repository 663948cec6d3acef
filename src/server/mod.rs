//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::storage::SqliteStorage;
use crate::suggestions::{SuggestionProvider, SuggestionSource};

/// Application state shared across handlers.
///
/// Holds no per-request state; the funnel engine is built per evaluation
/// from the provider's fallback policy.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SQLite invocation log.
    pub storage: SqliteStorage,
    /// Suggestion provider fixed at startup.
    pub provider: SuggestionProvider,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: SqliteStorage, provider: SuggestionProvider) -> Self {
        info!(provider = provider.name(), "AppState initialized");
        Self {
            config,
            storage,
            provider,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
