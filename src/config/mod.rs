use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: Option<LlmConfig>,
    pub provider: ProviderMode,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
}

/// Chat-completions API configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Which suggestion provider the server is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Live when an API key is configured, mock otherwise.
    Auto,
    Live,
    Mock,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let llm = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| LlmConfig {
                api_key,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com".to_string()),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.7),
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            });

        let provider = ProviderMode::parse(
            &env::var("SUGGESTION_PROVIDER").unwrap_or_else(|_| "auto".to_string()),
        )?;

        if provider == ProviderMode::Live && llm.is_none() {
            return Err(AppError::Config {
                message: "SUGGESTION_PROVIDER=live requires OPENAI_API_KEY".to_string(),
            });
        }

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/funnel.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(45000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        Ok(Config {
            llm,
            provider,
            database,
            logging,
            request,
        })
    }

    /// Whether the live provider will be used.
    pub fn use_live_provider(&self) -> bool {
        match self.provider {
            ProviderMode::Mock => false,
            ProviderMode::Live | ProviderMode::Auto => self.llm.is_some(),
        }
    }
}

impl ProviderMode {
    /// Parse a `SUGGESTION_PROVIDER` value
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(ProviderMode::Auto),
            "live" => Ok(ProviderMode::Live),
            "mock" => Ok(ProviderMode::Mock),
            other => Err(AppError::Config {
                message: format!(
                    "SUGGESTION_PROVIDER must be one of auto, live, mock (got '{}')",
                    other
                ),
            }),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 45000,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: ProviderMode, llm: Option<LlmConfig>) -> Config {
        Config {
            llm,
            provider,
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            request: RequestConfig::default(),
        }
    }

    #[test]
    fn test_provider_mode_parse() {
        assert_eq!(ProviderMode::parse("auto").unwrap(), ProviderMode::Auto);
        assert_eq!(ProviderMode::parse("").unwrap(), ProviderMode::Auto);
        assert_eq!(ProviderMode::parse("LIVE").unwrap(), ProviderMode::Live);
        assert_eq!(ProviderMode::parse(" mock ").unwrap(), ProviderMode::Mock);
        assert!(ProviderMode::parse("random").is_err());
    }

    #[test]
    fn test_auto_provider_follows_api_key() {
        let without_key = config_with(ProviderMode::Auto, None);
        assert!(!without_key.use_live_provider());

        let with_key = config_with(ProviderMode::Auto, Some(LlmConfig::default()));
        assert!(with_key.use_live_provider());
    }

    #[test]
    fn test_mock_provider_ignores_api_key() {
        let config = config_with(ProviderMode::Mock, Some(LlmConfig::default()));
        assert!(!config.use_live_provider());
    }

    #[test]
    fn test_request_config_default() {
        let request = RequestConfig::default();
        assert_eq!(request.timeout_ms, 45000);
        assert_eq!(request.max_retries, 2);
        assert_eq!(request.retry_delay_ms, 1000);
    }
}
