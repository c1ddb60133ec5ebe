//! Startup configuration.
//!
//! Every flag can also be set through the environment (and `.env`, loaded by
//! the binary before parsing). The resolved [`ServerConfig`] is fixed for the
//! life of the process.

use std::fmt;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(name = "research-server")]
#[command(about = "Research assistant HTTP server")]
#[command(version)]
pub struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Chat-completion API base URL
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    /// Chat-completion API key
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model name
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o")]
    pub llm_model: String,

    /// Per-request timeout for model calls, in seconds. Unset waits forever.
    #[arg(long, env = "LLM_TIMEOUT_SECS")]
    pub llm_timeout_secs: Option<u64>,

    /// Crossref REST API base URL
    #[arg(long, env = "CROSSREF_BASE_URL", default_value = "https://api.crossref.org")]
    pub crossref_base_url: String,

    /// Paper search API base URL
    #[arg(
        long,
        env = "PAPER_SEARCH_BASE_URL",
        default_value = "https://api.semanticscholar.org/graph/v1"
    )]
    pub search_base_url: String,

    /// Comma-separated CORS origins, or `*` for any
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub allowed_origins: String,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    Permissive,
    AllowList(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub llm: LlmConfig,
    pub crossref_base_url: String,
    pub search_base_url: String,
    pub cors: CorsPolicy,
}

fn http_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
    }
}

fn cors_policy(origins: &str) -> Result<CorsPolicy, ConfigError> {
    if origins.trim() == "*" {
        return Ok(CorsPolicy::Permissive);
    }
    let list: Vec<String> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if list.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: "ALLOWED_ORIGINS",
            value: origins.to_string(),
        });
    }
    Ok(CorsPolicy::AllowList(list))
}

impl TryFrom<Cli> for ServerConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let api_key = cli
            .llm_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential("LLM_API_KEY"))?;

        let timeout = match cli.llm_timeout_secs {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    name: "LLM_TIMEOUT_SECS",
                    value: "0".to_string(),
                })
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(ServerConfig {
            host: cli.host,
            port: cli.port,
            llm: LlmConfig {
                base_url: http_url("LLM_BASE_URL", &cli.llm_base_url)?,
                api_key,
                model: cli.llm_model,
                timeout,
            },
            crossref_base_url: http_url("CROSSREF_BASE_URL", &cli.crossref_base_url)?,
            search_base_url: http_url("PAPER_SEARCH_BASE_URL", &cli.search_base_url)?,
            cors: cors_policy(&cli.allowed_origins)?,
        })
    }
}
