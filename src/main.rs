use clap::Parser;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use journey_funnel_mcp::{
    cli::{evaluate_file, frameworks_table, Cli, Commands},
    config::{Config, LogFormat},
    server::{AppState, McpServer},
    storage::SqliteStorage,
    suggestions::{SuggestionProvider, SuggestionSource},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    match cli.resolved_command() {
        Commands::Serve => serve(config).await,
        Commands::Evaluate { path, mock } => {
            let report = evaluate_file(&config, &path, mock).await?;
            println!("{}", report);
            Ok(())
        }
        Commands::Frameworks => {
            println!("{}", frameworks_table());
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Journey funnel MCP server starting..."
    );

    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let provider = match SuggestionProvider::from_config(&config) {
        Ok(p) => {
            info!(provider = p.name(), "Suggestion provider initialized");
            p
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize suggestion provider");
            return Err(e.into());
        }
    };

    let state = Arc::new(AppState::new(config, storage, provider));
    let server = McpServer::new(state);

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing on stderr; stdout carries the protocol.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
