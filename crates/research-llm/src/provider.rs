use crate::types::Message;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response contained no completion choices")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// A single non-streaming round trip to a chat-completion service.
///
/// Implementations never retry and never cache: every call is a fresh
/// network request. Callers decide what a failure means for them.
#[async_trait]
pub trait LLMGateway: Send + Sync {
    /// Send `messages` and return the raw text of the first completion choice.
    ///
    /// `temperature` is expected in `[0, 1]`; values outside are clamped.
    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String>;

    /// Model identifier used for requests, for logging and health output.
    fn model(&self) -> &str {
        "unknown"
    }
}
