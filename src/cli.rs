//! Command-line interface.
//!
//! `serve` (the default) runs the MCP server on stdio. `evaluate` and
//! `frameworks` run one-off commands and print to stdout.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::funnel::types::{FunnelInput, FunnelReport};
use crate::funnel::FRAMEWORKS;
use crate::suggestions::{evaluate_with, MockProvider, SuggestionProvider, SuggestionSource};

/// Funnel scoring and reordering MCP server.
#[derive(Parser, Debug)]
#[command(name = "journey-funnel-mcp", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Evaluate a funnel described in a JSON file and print the report
    Evaluate {
        /// Path to a {steps, frameworks, suggestions?} JSON file
        path: PathBuf,

        /// Use offline mock suggestions even when an API key is configured
        #[arg(long)]
        mock: bool,
    },

    /// List the known frameworks
    Frameworks,
}

impl Cli {
    /// Subcommand to run, `serve` when none was given.
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Read a funnel input file.
pub fn read_input(path: &Path) -> AppResult<FunnelInput> {
    let raw = std::fs::read_to_string(path).map_err(|e| AppError::Internal {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    serde_json::from_str(&raw).map_err(|e| AppError::Internal {
        message: format!("Invalid funnel input in {}: {}", path.display(), e),
    })
}

/// Run the `evaluate` command and return the pretty-printed report.
pub async fn evaluate_file(config: &Config, path: &Path, mock: bool) -> AppResult<String> {
    let input = read_input(path)?;
    let evaluation = if mock {
        evaluate_with(&MockProvider::new(), input).await?
    } else {
        let provider = SuggestionProvider::from_config(config)?;
        info!(provider = provider.name(), "Evaluating funnel file");
        evaluate_with(&provider, input).await?
    };
    render_report(&evaluation.report)
}

fn render_report(report: &FunnelReport) -> AppResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| AppError::Internal {
        message: format!("Failed to serialize report: {}", e),
    })
}

/// Framework catalog as aligned text lines.
pub fn frameworks_table() -> String {
    FRAMEWORKS
        .iter()
        .map(|f| format!("{:<9} {:<48} {}", f.id, f.name, f.focus))
        .collect::<Vec<_>>()
        .join("\n")
}
